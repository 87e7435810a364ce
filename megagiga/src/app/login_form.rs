use crossterm::event::{Event, KeyCode, KeyEvent};
use megagiga_core::{LoginStateHolder, LoginUiState};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

/// Which field has the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    /// Email
    Email,

    /// Password
    Password,
}

impl Field {
    /// Move to the other field. With two fields, forwards and backwards are
    /// the same thing.
    fn toggle(self) -> Self {
        match self {
            Self::Email => Self::Password,
            Self::Password => Self::Email,
        }
    }
}

/// Editing state for the login form. The text itself lives in the
/// `LoginStateHolder`; we mirror it here to get cursor handling.
#[derive(Debug)]
pub struct LoginForm {
    /// Which field we're editing
    active: Field,

    /// Who are you?
    email: Input,

    /// What's your password? (Will be masked)
    password: Input,
}

impl LoginForm {
    /// Start with whatever the holder already has, so coming back to the
    /// form doesn't lose anything.
    pub fn new(state: &LoginUiState) -> Self {
        Self {
            active: Field::Email,
            email: Input::new(state.email.clone()),
            password: Input::new(state.password.clone()),
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    pub fn render(&self, body_area: Rect, frame: &mut Frame<'_>, state: &LoginUiState) {
        let popup_vert = Layout::vertical([Constraint::Length(6)]).flex(Flex::Center);
        let popup_horiz = Layout::horizontal([Constraint::Percentage(50)]).flex(Flex::Center);

        let [popup_area] = popup_vert.areas(body_area);
        let [popup_area] = popup_horiz.areas(popup_area);
        frame.render_widget(Clear, popup_area);

        let width = popup_area.width.saturating_sub(2 + 1); // -2 for the border, -1 for the cursor

        let fields = Layout::vertical(Constraint::from_lengths([3, 3]));
        let [email_area, password_area] = fields.areas(popup_area);

        // dim the form while we wait on the server
        let border_style = if state.is_fetching {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Blue)
        };

        for (field, input, area, title) in [
            (Field::Email, &self.email, email_area, "Email"),
            (Field::Password, &self.password, password_area, "Password"),
        ] {
            let scroll = input.visual_scroll(width as usize);

            let shown = match field {
                Field::Email => input.value().to_string(),
                Field::Password => "*".repeat(input.value().chars().count()),
            };

            let widget = Paragraph::new(shown).scroll((0, scroll as u16)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border_style),
            );

            frame.render_widget(widget, area);

            if self.active == field {
                frame.set_cursor_position((
                    area.x
                        + (input.visual_cursor().max(scroll) - scroll) as u16 // current end of text
                        + 1, // just past the end of the text
                    area.y + 1, // +1 row for the border/title
                ));
            }
        }
    }

    /// Handle a key meant for the form, pushing any text changes into the
    /// holder.
    pub fn handle_event(&mut self, key: KeyEvent, holder: &LoginStateHolder) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.active = self.active.toggle();
            }
            _ => {
                let event = Event::Key(key);

                match self.active {
                    Field::Email => {
                        if self.email.handle_event(&event).is_some_and(|c| c.value) {
                            holder.update_email(self.email.value());
                        }
                    }
                    Field::Password => {
                        if self.password.handle_event(&event).is_some_and(|c| c.value) {
                            holder.update_password(self.password.value());
                        }
                    }
                }
            }
        }
    }
}
