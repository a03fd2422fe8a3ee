//! UI utilities for the client.

use std::io::Write;

use teleconsult_server::domain::Role;

/// Redisplay the prompt after printing a message
pub fn redisplay_prompt(role: Role) {
    print!("{}> ", role);
    std::io::stdout().flush().ok();
}
