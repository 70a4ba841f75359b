// src/config/messages.rs
// User-visible strings. Templates use `{name}` placeholders.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
    pub access_denied: String,
    pub invalid_command: String,
    pub invalid_request: String,
    pub not_implemented: String,
    pub directory_missing: String,
    pub mkdir_failed: String,
    pub mkfile_failed: String,
    pub rename_exists: String,
    pub rename_failed: String,
    pub upload_failed: String,
    pub upload_too_large: String,
    pub paste_failed: String,
    pub paste_item_exists: String,
    pub paste_into_itself: String,
    pub missing_filename: String,
    pub rm_empty: String,
    pub rm_failed: String,
    pub duplicate_failed: String,
    pub read_failed: String,
    pub edit_failed: String,
    pub resize_missing: String,
    pub resize_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            access_denied: "Access Denied".to_string(),
            invalid_command: "Invalid command '{cmd}'".to_string(),
            invalid_request: "Invalid request: {reason}".to_string(),
            not_implemented: "Command '{cmd}' not yet implemented".to_string(),
            directory_missing: "Directory does not exist".to_string(),
            mkdir_failed: "Unable to create folder".to_string(),
            mkfile_failed: "Unable to create file".to_string(),
            rename_exists: "Unable to rename {type}. '{name}' already exists".to_string(),
            rename_failed: "Unable to rename {type}".to_string(),
            upload_failed: "Some files were unable to be uploaded".to_string(),
            upload_too_large: "exceeds the upload limit of {limit}".to_string(),
            paste_failed: "Some files were unable to be copied".to_string(),
            paste_item_exists: "already exists in '{dir}'".to_string(),
            paste_into_itself: "cannot be copied into itself".to_string(),
            missing_filename: "has no original filename".to_string(),
            rm_empty: "No files were selected for removal".to_string(),
            rm_failed: "Unable to remove {name}".to_string(),
            duplicate_failed: "Unable to duplicate {type}".to_string(),
            read_failed: "Unable to read file".to_string(),
            edit_failed: "Unable to save file".to_string(),
            resize_missing: "Unable to resize file. It does not exist".to_string(),
            resize_failed: "Unable to resize file".to_string(),
        }
    }
}

/// Substitutes every `{key}` in `template` with its value
pub fn render(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
