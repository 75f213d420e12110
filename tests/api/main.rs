mod admin;
mod count;
mod health_check;
mod helpers;
