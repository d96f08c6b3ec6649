pub mod handlers;
pub mod prompts;
pub mod service;
pub mod state_machine;
pub mod template;
pub mod validator;
