pub mod prompts;

pub use prompts::confirm;
