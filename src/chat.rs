use std::path::Path;

use async_trait::async_trait;

use crate::error::ChatError;

/// Request-reply conversation with the user.
///
/// The session drives everything through this trait; the transport behind it
/// (terminal, messenger bot) owns prompt correlation and any timeouts.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Show `prompt` and wait for the user's reply
    async fn ask(&self, prompt: &str) -> Result<String, ChatError>;

    /// Show an informational message
    async fn say(&self, text: &str) -> Result<(), ChatError>;

    /// Hand the finished export to the user under `file_name`
    async fn deliver(&self, document: &Path, file_name: &str, caption: &str)
    -> Result<(), ChatError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    /// A delivered document as observed at delivery time
    #[derive(Debug, Clone)]
    pub struct Delivery {
        pub path: PathBuf,
        pub file_name: String,
        pub caption: String,
        pub content: String,
    }

    /// Chat that answers prompts from a fixed script
    #[derive(Default)]
    pub struct ScriptedChat {
        replies: Mutex<VecDeque<String>>,
        pub prompts: Mutex<Vec<String>>,
        pub messages: Mutex<Vec<String>>,
        pub deliveries: Mutex<Vec<Delivery>>,
        pub fail_delivery: bool,
        pub fail_messages: bool,
    }

    impl ScriptedChat {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                ..Default::default()
            }
        }

        pub fn failing_delivery(mut self) -> Self {
            self.fail_delivery = true;
            self
        }

        pub fn failing_messages(mut self) -> Self {
            self.fail_messages = true;
            self
        }
    }

    #[async_trait]
    impl ChatSession for ScriptedChat {
        async fn ask(&self, prompt: &str) -> Result<String, ChatError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ChatError::Closed)
        }

        async fn say(&self, text: &str) -> Result<(), ChatError> {
            if self.fail_messages {
                return Err(ChatError::Closed);
            }
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn deliver(
            &self,
            document: &Path,
            file_name: &str,
            caption: &str,
        ) -> Result<(), ChatError> {
            let content =
                std::fs::read_to_string(document).map_err(|e| ChatError::Delivery {
                    path: document.to_path_buf(),
                    source: e,
                })?;

            self.deliveries.lock().unwrap().push(Delivery {
                path: document.to_path_buf(),
                file_name: file_name.to_string(),
                caption: caption.to_string(),
                content,
            });

            if self.fail_delivery {
                return Err(ChatError::Delivery {
                    path: document.to_path_buf(),
                    source: std::io::Error::other("upload rejected"),
                });
            }
            Ok(())
        }
    }
}
