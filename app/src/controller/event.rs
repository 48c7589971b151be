use std::collections::HashMap;

use derive_more::derive::Display;

/// Operator commands sent by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Command {
    #[display("QUERY")]
    Query,
    #[display("REMOVE_NOTICES_ALL")]
    RemoveNoticesAll,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "QUERY" => Some(Command::Query),
            "REMOVE_NOTICES_ALL" => Some(Command::RemoveNoticesAll),
            _ => None,
        }
    }
}

/// Everything the controller delivers to the node, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    Params(HashMap<String, String>),
    Command(Command),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_case_insensitive() {
        assert_eq!(Command::from_name("QUERY"), Some(Command::Query));
        assert_eq!(Command::from_name(" remove_notices_all\n"), Some(Command::RemoveNoticesAll));
        assert_eq!(Command::from_name("DISCOVER"), None);
        assert_eq!(Command::RemoveNoticesAll.to_string(), "REMOVE_NOTICES_ALL");
    }
}
