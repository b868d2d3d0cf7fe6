mod client;
mod cors;
mod csrf;
mod health_check;
mod helpers;
