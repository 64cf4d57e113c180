//! playship - publish Android APKs to Google Play from CI.

use std::process;

use playship::cli::{self, OutputManager};
use playship::error::{ApiError, PublishError};

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Create output manager for error display (never quiet for fatal errors)
            let output = OutputManager::new(false);
            output.error(&format!("Upload failed: {e}"));

            // Surface the server's own explanation when there is one
            if let PublishError::Api(ApiError::Api { messages, .. }) = &e {
                for message in messages {
                    output.error(&format!("- {message}"));
                }
            }

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            process::exit(2);
        }
    }
}
