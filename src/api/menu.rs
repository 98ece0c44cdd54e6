//! Context menu actions

use super::router::{MessageRouter, Request, Response};
use crate::types::OptionOverrides;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Check the selected text
    CheckSelection(String),
    ToggleExtension,
    OpenSettings,
}

impl MenuAction {
    pub const CHECK_ID: &'static str = "writeright-check";
    pub const TOGGLE_ID: &'static str = "writeright-toggle";
    pub const SETTINGS_ID: &'static str = "writeright-settings";

    /// Map a menu item id to its action; `selection` feeds the check action
    pub fn from_menu_id(id: &str, selection: Option<&str>) -> Option<Self> {
        match id {
            Self::CHECK_ID => selection
                .filter(|s| !s.trim().is_empty())
                .map(|s| MenuAction::CheckSelection(s.to_string())),
            Self::TOGGLE_ID => Some(MenuAction::ToggleExtension),
            Self::SETTINGS_ID => Some(MenuAction::OpenSettings),
            _ => None,
        }
    }

    pub fn menu_id(&self) -> &'static str {
        match self {
            MenuAction::CheckSelection(_) => Self::CHECK_ID,
            MenuAction::ToggleExtension => Self::TOGGLE_ID,
            MenuAction::OpenSettings => Self::SETTINGS_ID,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MenuAction::CheckSelection(_) => "Check with WriteRight",
            MenuAction::ToggleExtension => "Toggle WriteRight",
            MenuAction::OpenSettings => "WriteRight Settings",
        }
    }

    pub async fn run(self, router: &MessageRouter) -> Response {
        let request = match self {
            MenuAction::CheckSelection(text) => Request::CheckGrammar {
                text,
                options: OptionOverrides::default(),
            },
            MenuAction::ToggleExtension => Request::ToggleExtension,
            MenuAction::OpenSettings => Request::GetSettings,
        };
        router.handle(request).await
    }
}
