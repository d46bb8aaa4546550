mod auth_tests;
mod health_tests;
mod post_tests;
mod search_tests;
