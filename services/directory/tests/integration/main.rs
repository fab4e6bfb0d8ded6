mod helpers;

mod app_test;
mod department_test;
