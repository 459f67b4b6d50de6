mod chat;
mod helpers;
mod orders;
