/// Things that can happen to the app
mod action;
pub use action::Action;

/// Side effects the app asks for
mod effect;
pub use effect::Effect;

/// The login form
mod login_form;
use login_form::LoginForm;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use megagiga_core::LoginStateHolder;
use ratatui::{
    layout::{Constraint, Flex, Layout},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::{process::ExitCode, sync::Arc};

/// The "functional core" of the app.
#[derive(Debug)]
pub struct App {
    /// Status to display (visible at the bottom of the screen)
    status_line: Option<String>,

    /// Which screen we're on
    screen: Screen,

    /// Login form state and the session
    holder: Arc<LoginStateHolder>,

    /// Set when we want to exit with this code after final effects
    exiting: Option<ExitCode>,
}

/// What the user is looking at
#[derive(Debug)]
enum Screen {
    /// We haven't checked for a stored session yet
    Loading,

    /// Asking for credentials
    Login(LoginForm),

    /// We have a session
    Session {
        /// When the tokens were issued (or restored from)
        since: DateTime<Utc>,
    },
}

impl App {
    /// Create a new instance of the app
    pub fn new(holder: Arc<LoginStateHolder>) -> Self {
        Self {
            status_line: None,
            screen: Screen::Loading,
            holder,
            exiting: None,
        }
    }

    /// Render the app's UI to the screen
    pub fn render(&self, frame: &mut Frame) {
        let vertical = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]);
        let [body_area, status_area] = vertical.areas(frame.area());

        let state = self.holder.state();

        match &self.screen {
            Screen::Loading => frame.render_widget(Paragraph::new("Loading…"), body_area),
            Screen::Login(form) => form.render(body_area, frame, &state),
            Screen::Session { since } => {
                let popup_vert = Layout::vertical([Constraint::Length(6)]).flex(Flex::Center);
                let popup_horiz =
                    Layout::horizontal([Constraint::Percentage(50)]).flex(Flex::Center);

                let [popup_area] = popup_vert.areas(body_area);
                let [popup_area] = popup_horiz.areas(popup_area);

                let body = Paragraph::new(vec![
                    Line::from("Logged in".bold()),
                    Line::from(format!(
                        "Session since {}",
                        since.with_timezone(&Local).to_rfc2822()
                    )),
                    Line::from(""),
                    Line::from("r: refresh   l: log out   q: quit".fg(Color::DarkGray)),
                ])
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Green)),
                );

                frame.render_widget(body, popup_area);
            }
        }

        let status = if matches!(self.screen, Screen::Login(_)) && state.is_fetching {
            "Logging in…".to_string()
        } else if let Some(problem) = state.problem {
            problem
        } else {
            self.status_line
                .clone()
                .unwrap_or_else(|| "All good!".to_string())
        };

        frame.render_widget(Paragraph::new(status), status_area);
    }

    /// Produce any side effects as needed to initialize the app.
    #[expect(clippy::unused_self)]
    pub fn init(&self) -> Effect {
        Effect::LoadSession
    }

    /// Handle an `Action`, updating the app's state and producing some side effect(s)
    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::LoadedSession(Some(stored)) => {
                // switch screens before the signal arrives so we don't save
                // what we just loaded
                self.screen = Screen::Session {
                    since: stored.saved_at,
                };
                self.holder.restore(stored.tokens);
                self.status_line = Some("Restored session".to_owned());

                vec![]
            }
            Action::LoadedSession(None) => {
                self.screen = Screen::Login(LoginForm::new(&self.holder.state()));

                vec![]
            }
            Action::SavedSession(saved_at) => {
                if let Screen::Session { since } = &mut self.screen {
                    *since = saved_at;
                }
                self.status_line = Some("Saved session".to_owned());

                vec![]
            }
            Action::ClearedSession => {
                self.status_line = Some("Logged out".to_owned());

                vec![]
            }
            Action::LoginStateChanged => vec![],
            Action::AuthenticatedChanged(true) => {
                if matches!(self.screen, Screen::Session { .. }) {
                    return vec![];
                }

                self.screen = Screen::Session { since: Utc::now() };
                self.status_line = Some("Logged in".to_owned());

                self.holder
                    .session()
                    .map(Effect::SaveSession)
                    .into_iter()
                    .collect()
            }
            Action::AuthenticatedChanged(false) => {
                if matches!(self.screen, Screen::Session { .. }) {
                    self.screen = Screen::Login(LoginForm::new(&self.holder.state()));
                    vec![Effect::ClearSession]
                } else {
                    vec![]
                }
            }
            Action::Refreshed(tokens) => {
                // logged out while the refresh was out; nothing to save
                if !matches!(self.screen, Screen::Session { .. }) {
                    return vec![];
                }

                self.status_line = Some("Refreshed session".to_owned());

                vec![Effect::SaveSession(tokens)]
            }
            Action::Key(key) => self.handle_key(key),
            Action::Problem(problem) => {
                self.status_line = Some(problem);

                vec![]
            }
        }
    }

    /// Keyboard input, dispatched by screen
    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.exit();
            return vec![];
        }

        match &mut self.screen {
            Screen::Loading => vec![],
            Screen::Login(form) => match key.code {
                KeyCode::Esc => {
                    self.exit();
                    vec![]
                }
                KeyCode::Enter => {
                    if self.holder.state().is_fetching {
                        self.status_line = Some("Already logging in".to_owned());
                        vec![]
                    } else {
                        vec![Effect::LogIn(Arc::clone(&self.holder))]
                    }
                }
                _ => {
                    form.handle_event(key, &self.holder);
                    vec![]
                }
            },
            Screen::Session { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.exit();
                    vec![]
                }
                KeyCode::Char('r') => vec![Effect::Refresh(Arc::clone(&self.holder))],
                KeyCode::Char('l') => {
                    self.screen = Screen::Login(LoginForm::new(&self.holder.state()));
                    self.holder.logout();

                    vec![Effect::ClearSession]
                }
                _ => {
                    self.status_line = Some(format!("Unknown key {:?}", key.code));

                    vec![]
                }
            },
        }
    }

    /// Stop whatever is in flight and get ready to exit.
    fn exit(&mut self) {
        self.holder.cancel();
        self.exiting = Some(ExitCode::SUCCESS);
    }

    /// Let the TUI manager know whether we're all wrapped up and can exit.
    pub fn should_exit(&self) -> Option<ExitCode> {
        self.exiting
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use megagiga_core::session::RemoteSessionRepository;
    use megagiga_core::{Client, StoredSession, TokenPair};

    fn app() -> App {
        let repository =
            RemoteSessionRepository::new(Client::new("http://127.0.0.1:1/"), reqwest::Client::new());
        App::new(Arc::new(LoginStateHolder::new(Arc::new(repository))))
    }

    fn press(code: KeyCode) -> Action {
        Action::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn no_stored_session_shows_login() {
        let mut app = app();

        assert!(matches!(app.init(), Effect::LoadSession));
        assert!(app.handle(Action::LoadedSession(None)).is_empty());

        assert!(matches!(app.screen, Screen::Login(_)));
    }

    #[test]
    fn stored_session_skips_login() {
        let mut app = app();

        let effects = app.handle(Action::LoadedSession(Some(StoredSession::now(
            TokenPair::new("A", "B"),
        ))));
        assert!(effects.is_empty());
        assert!(app.holder.is_authenticated());

        // the signal from restoring shouldn't cause a save
        assert!(app.handle(Action::AuthenticatedChanged(true)).is_empty());
        assert!(matches!(app.screen, Screen::Session { .. }));
    }

    #[test]
    fn enter_logs_in() {
        let mut app = app();
        app.handle(Action::LoadedSession(None));

        for c in "a@b.co".chars() {
            app.handle(press(KeyCode::Char(c)));
        }
        let effects = app.handle(press(KeyCode::Enter));

        assert!(matches!(effects.as_slice(), [Effect::LogIn(_)]));
        assert_eq!(app.holder.state().email, "a@b.co");
    }

    #[test]
    fn authenticated_signal_navigates_and_saves() {
        let mut app = app();
        app.handle(Action::LoadedSession(None));
        app.holder.restore(TokenPair::new("A", "B"));

        let effects = app.handle(Action::AuthenticatedChanged(true));

        assert!(matches!(app.screen, Screen::Session { .. }));
        match effects.as_slice() {
            [Effect::SaveSession(tokens)] => assert_eq!(*tokens, TokenPair::new("A", "B")),
            other => panic!("expected a save, got {other:?}"),
        }
    }

    #[test]
    fn logout_clears_session() {
        let mut app = app();
        app.handle(Action::LoadedSession(Some(StoredSession::now(
            TokenPair::new("A", "B"),
        ))));

        let effects = app.handle(press(KeyCode::Char('l')));

        assert!(matches!(effects.as_slice(), [Effect::ClearSession]));
        assert!(matches!(app.screen, Screen::Login(_)));
        assert!(!app.holder.is_authenticated());

        // and the signal that follows is a no-op
        assert!(app.handle(Action::AuthenticatedChanged(false)).is_empty());
    }

    #[test]
    fn refresh_key_refreshes() {
        let mut app = app();
        app.handle(Action::LoadedSession(Some(StoredSession::now(
            TokenPair::new("A", "B"),
        ))));

        let effects = app.handle(press(KeyCode::Char('r')));
        assert!(matches!(effects.as_slice(), [Effect::Refresh(_)]));

        let effects = app.handle(Action::Refreshed(TokenPair::new("C", "D")));
        assert!(matches!(effects.as_slice(), [Effect::SaveSession(_)]));
    }

    #[test]
    fn refresh_after_logout_is_not_saved() {
        let mut app = app();
        app.handle(Action::LoadedSession(Some(StoredSession::now(
            TokenPair::new("A", "B"),
        ))));

        app.handle(press(KeyCode::Char('r')));
        app.handle(press(KeyCode::Char('l')));

        let effects = app.handle(Action::Refreshed(TokenPair::new("C", "D")));
        assert!(effects.is_empty());
        assert!(matches!(app.screen, Screen::Login(_)));
    }

    #[test]
    fn escape_on_login_exits() {
        let mut app = app();
        app.handle(Action::LoadedSession(None));

        app.handle(press(KeyCode::Esc));

        assert_eq!(app.should_exit(), Some(ExitCode::SUCCESS));
    }
}
