//! The screen transition table.
//!
//! Every `(Screen, Trigger)` pair resolves to exactly one `Outcome`: either a
//! transition with the render action to perform, or a rejection that leaves
//! the session untouched.

use super::events::CallbackAction;
use super::session::Screen;

/// What happened, with payloads stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    OpenMenu,
    SetConfig,
    Callback(CallbackAction),
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::OpenMenu,
        Trigger::SetConfig,
        Trigger::Callback(CallbackAction::Status),
        Trigger::Callback(CallbackAction::Settings),
        Trigger::Callback(CallbackAction::Players),
        Trigger::Callback(CallbackAction::Back),
        Trigger::Callback(CallbackAction::Refresh),
    ];
}

/// Render work attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Send a fresh main menu; it becomes the new anchor.
    SendMainMenu,
    /// Edit the anchor back to the main menu.
    EditMainMenu,
    /// Probe the server and edit the anchor with the result.
    EditStatus,
    /// Probe the server and edit the anchor with its player list.
    EditPlayers,
    /// Edit the anchor with the stored configuration.
    EditSettings,
    /// Parse and save a new address, then re-render settings.
    ApplyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A command used outside the screen it belongs to. The user gets guidance.
    WrongScreen,
    /// A button pressed on a screen where it does not apply, e.g. after a restart.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transition { to: Screen, action: Action },
    Rejected(Rejection),
}

struct Rule {
    trigger: Trigger,
    from: &'static [Screen],
    to: Screen,
    action: Action,
}

const RULES: &[Rule] = &[
    Rule {
        trigger: Trigger::OpenMenu,
        from: &Screen::ALL,
        to: Screen::MainMenu,
        action: Action::SendMainMenu,
    },
    Rule {
        trigger: Trigger::Callback(CallbackAction::Status),
        from: &[Screen::MainMenu, Screen::Status, Screen::Players],
        to: Screen::Status,
        action: Action::EditStatus,
    },
    Rule {
        trigger: Trigger::Callback(CallbackAction::Settings),
        from: &[Screen::MainMenu, Screen::Settings],
        to: Screen::Settings,
        action: Action::EditSettings,
    },
    Rule {
        trigger: Trigger::Callback(CallbackAction::Players),
        from: &[Screen::MainMenu, Screen::Status, Screen::Players],
        to: Screen::Players,
        action: Action::EditPlayers,
    },
    Rule {
        trigger: Trigger::Callback(CallbackAction::Back),
        from: &[Screen::Status, Screen::Settings, Screen::Players],
        to: Screen::MainMenu,
        action: Action::EditMainMenu,
    },
    Rule {
        trigger: Trigger::Callback(CallbackAction::Refresh),
        from: &[Screen::Status],
        to: Screen::Status,
        action: Action::EditStatus,
    },
    Rule {
        trigger: Trigger::SetConfig,
        from: &[Screen::Settings],
        to: Screen::Settings,
        action: Action::ApplyConfig,
    },
];

/// Resolve a trigger against the current screen.
pub fn transition(from: Screen, trigger: Trigger) -> Outcome {
    let rule = RULES
        .iter()
        .find(|r| r.trigger == trigger && r.from.contains(&from));

    match rule {
        Some(rule) => Outcome::Transition {
            to: rule.to,
            action: rule.action,
        },
        None => match trigger {
            Trigger::OpenMenu | Trigger::SetConfig => Outcome::Rejected(Rejection::WrongScreen),
            Trigger::Callback(_) => Outcome::Rejected(Rejection::Stale),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_has_exactly_one_outcome() {
        for screen in Screen::ALL {
            for trigger in Trigger::ALL {
                let matching = RULES
                    .iter()
                    .filter(|r| r.trigger == trigger && r.from.contains(&screen))
                    .count();
                assert!(matching <= 1, "ambiguous rules for {screen:?} + {trigger:?}");

                let outcome = transition(screen, trigger);
                match outcome {
                    Outcome::Transition { to, .. } => {
                        assert_eq!(matching, 1);
                        assert_ne!(to, Screen::None, "no transition leads back to None");
                    }
                    Outcome::Rejected(_) => assert_eq!(matching, 0),
                }
            }
        }
    }

    #[test]
    fn test_open_menu_from_anywhere() {
        for screen in Screen::ALL {
            assert_eq!(
                transition(screen, Trigger::OpenMenu),
                Outcome::Transition {
                    to: Screen::MainMenu,
                    action: Action::SendMainMenu
                }
            );
        }
    }

    #[test]
    fn test_back_returns_to_main_menu() {
        for screen in [Screen::Status, Screen::Settings, Screen::Players] {
            assert_eq!(
                transition(screen, Trigger::Callback(CallbackAction::Back)),
                Outcome::Transition {
                    to: Screen::MainMenu,
                    action: Action::EditMainMenu
                }
            );
        }
        assert_eq!(
            transition(Screen::MainMenu, Trigger::Callback(CallbackAction::Back)),
            Outcome::Rejected(Rejection::Stale)
        );
    }

    #[test]
    fn test_set_config_only_in_settings() {
        assert_eq!(
            transition(Screen::Settings, Trigger::SetConfig),
            Outcome::Transition {
                to: Screen::Settings,
                action: Action::ApplyConfig
            }
        );
        for screen in [Screen::None, Screen::MainMenu, Screen::Status, Screen::Players] {
            assert_eq!(
                transition(screen, Trigger::SetConfig),
                Outcome::Rejected(Rejection::WrongScreen)
            );
        }
    }

    #[test]
    fn test_refresh_only_on_status() {
        assert_eq!(
            transition(Screen::Status, Trigger::Callback(CallbackAction::Refresh)),
            Outcome::Transition {
                to: Screen::Status,
                action: Action::EditStatus
            }
        );
        assert_eq!(
            transition(Screen::MainMenu, Trigger::Callback(CallbackAction::Refresh)),
            Outcome::Rejected(Rejection::Stale)
        );
    }

    #[test]
    fn test_callbacks_before_menu_are_stale() {
        for action in CallbackAction::ALL {
            assert_eq!(
                transition(Screen::None, Trigger::Callback(action)),
                Outcome::Rejected(Rejection::Stale)
            );
        }
    }

    #[test]
    fn test_menu_reaches_every_screen() {
        let targets: Vec<Screen> = [
            CallbackAction::Status,
            CallbackAction::Settings,
            CallbackAction::Players,
        ]
        .into_iter()
        .filter_map(|a| match transition(Screen::MainMenu, Trigger::Callback(a)) {
            Outcome::Transition { to, .. } => Some(to),
            Outcome::Rejected(_) => None,
        })
        .collect();
        assert_eq!(targets, vec![Screen::Status, Screen::Settings, Screen::Players]);
    }
}
