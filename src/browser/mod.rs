pub mod action;
pub mod agent_browser;
pub mod driver;
pub mod screenshot;
pub mod selector;

pub use action::{
    Action, ActionKind, ActionType, ClickAction, HoverAction, KeyboardKey, NavigateAction,
    PressKeyAction, ScrollAction, ScrollDirection, SelectAction, TypeAction, WaitAction,
    WaitCondition,
};
pub use agent_browser::{AgentBrowserDriver, NavigationPolicy};
pub use driver::{ActionOutput, BrowserDriver, perform};
pub use screenshot::{ImageFormat, ScreenshotMetadata};
pub use selector::{ElementSelector, SelectorStrategy};
