//! Folder navigation within a content directory.

use thiserror::Error;

use crate::protocol_constants::ROOT_CONTAINER_ID;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// Tried to go back from the root folder.
    #[error("illegal navigation: already at the root folder")]
    IllegalNavigation,
}

/// Stack of folder ids from the root to the current folder.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            stack: vec![ROOT_CONTAINER_ID.to_string()],
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the folder currently shown.
    pub fn current(&self) -> &str {
        self.stack.last().map_or(ROOT_CONTAINER_ID, String::as_str)
    }

    pub fn at_root(&self) -> bool {
        self.stack.len() <= 1
    }

    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Back to the root folder.
    pub fn home(&mut self) {
        self.stack.truncate(1);
    }

    /// Descends into `folder_id`. Re-entering the current folder is a no-op.
    pub fn enter(&mut self, folder_id: &str) {
        if folder_id == ROOT_CONTAINER_ID {
            self.home();
        } else if self.current() != folder_id {
            self.stack.push(folder_id.to_string());
        }
    }

    /// Leaves the current folder, returning the parent id.
    pub fn back(&mut self) -> Result<&str, NavigationError> {
        if self.at_root() {
            return Err(NavigationError::IllegalNavigation);
        }
        self.stack.pop();
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_back() {
        let mut nav = Navigator::new();
        assert_eq!(nav.current(), "0");
        assert!(nav.at_root());

        nav.enter("64");
        nav.enter("64$1");
        nav.enter("64$1");
        assert_eq!(nav.depth(), 2);

        assert_eq!(nav.back(), Ok("64"));
        assert_eq!(nav.back(), Ok("0"));
        assert_eq!(nav.back(), Err(NavigationError::IllegalNavigation));
    }

    #[test]
    fn home_and_root_reset_the_stack() {
        let mut nav = Navigator::new();
        nav.enter("1");
        nav.enter("2");
        nav.home();
        assert!(nav.at_root());

        nav.enter("3");
        nav.enter("0");
        assert!(nav.at_root());
    }
}
