//! Application core: event loop, action dispatch, header and help overlay.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use snmpdash_core::{DisplayStatus, Monitor, current_status};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, TerminalEvents};
use crate::screens::dashboard::Dashboard;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::metrics_fmt::age;

/// Redraw period for the header clock.
const HEADER_CLOCK: Duration = Duration::from_secs(1);

/// Top-level application state and event loop.
pub struct App {
    monitor: Monitor,
    dashboard: Dashboard,
    running: bool,
    connected: bool,
    ip_address: Option<String>,
    notification: Option<String>,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(monitor: Monitor) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            monitor,
            dashboard: Dashboard::new(),
            running: true,
            connected: false,
            ip_address: None,
            notification: None,
            help_visible: false,
            action_tx,
            action_rx,
        }
    }

    /// Label shown in the header.
    pub fn display_status(&self) -> DisplayStatus {
        current_status(self.connected, self.dashboard.latest_source())
    }

    /// Run until the user quits. Leaving cancels the data bridge and the
    /// whole monitor pipeline.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.monitor.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));

        let mut events = TerminalEvents::new(HEADER_CLOCK);

        info!("TUI event loop started");

        while self.running {
            tui.draw(|frame| self.render(frame))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(Event::Key(key)) => {
                        if let Some(action) = self.handle_key_event(key)? {
                            self.process_action(&action)?;
                        }
                    }
                    Some(Event::Resize | Event::Clock) => {}
                    None => break,
                },
                Some(action) = self.action_rx.recv() => self.process_action(&action)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
            }
        }

        cancel.cancel();
        self.monitor.shutdown();
        let _ = tokio::time::timeout(Duration::from_secs(1), bridge).await;
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::NONE, KeyCode::Char('q')) => {
                Ok(Some(Action::Quit))
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                Ok(Some(Action::ToggleHelp))
            }
            _ => self.dashboard.handle_key_event(key),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::ConnectionChanged(connected) => {
                debug!(connected, "connection label updated");
                self.connected = *connected;
                if *connected {
                    self.notification = None;
                }
            }
            Action::IpAddress(ip) => self.ip_address = Some(ip.clone()),
            Action::Notify(message) => self.notification = Some(message.clone()),
            other => {
                if let Some(follow_up) = self.dashboard.update(other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        self.dashboard.render(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let status = self.display_status();
        let sep = Span::styled(" │ ", theme::key_hint());

        let mut spans = vec![
            Span::styled(
                " snmpdash",
                Style::default()
                    .fg(theme::ELECTRIC_PURPLE)
                    .add_modifier(Modifier::BOLD),
            ),
            sep.clone(),
            Span::styled(
                format!("● {status}"),
                Style::default().fg(theme::connection_color(status)),
            ),
            sep.clone(),
            Span::styled("IP ", theme::key_hint()),
            Span::styled(
                self.ip_address.clone().unwrap_or_else(|| "—".into()),
                theme::text(),
            ),
        ];

        if let Some(snapshot) = self.dashboard.latest() {
            spans.push(sep);
            spans.push(Span::styled("updated ", theme::key_hint()));
            spans.push(Span::styled(snapshot.last_update.clone(), theme::text()));
            if let Some(ago) = age(&snapshot.last_update, chrono::Utc::now()) {
                spans.push(Span::styled(format!(" ({ago} ago)"), theme::key_hint()));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.notification {
            Some(message) => Line::from(Span::styled(
                format!(" {message}"),
                Style::default().fg(theme::ERROR_RED),
            )),
            None => Line::from(vec![
                Span::styled(" q", theme::key_hint_key()),
                Span::styled(" quit  ", theme::key_hint()),
                Span::styled("?", theme::key_hint_key()),
                Span::styled(" help", theme::key_hint()),
            ]),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 52u16.min(area.width.saturating_sub(4));
        let height = 13u16.min(area.height.saturating_sub(4));
        let help_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let status = |label: DisplayStatus, what: &'static str| {
            Line::from(vec![
                Span::styled(
                    format!("  ● {:<8}", label.as_ref()),
                    Style::default().fg(theme::connection_color(label)),
                ),
                Span::styled(what, theme::key_hint()),
            ])
        };

        let text = vec![
            Line::from(""),
            key("q  Ctrl+c", "Quit"),
            key("?", "Toggle this help"),
            Line::from(""),
            status(DisplayStatus::Push, "live push channel"),
            status(DisplayStatus::Pull, "pulled data, channel down"),
            status(DisplayStatus::Disconnected, "no live data"),
            Line::from(""),
            Line::from(Span::styled("                 Esc or ? to close", theme::key_hint())),
        ];

        frame.render_widget(Paragraph::new(text).block(block), help_area);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use snmpdash_core::{MonitorConfig, NetworkMetricsSnapshot};

    use super::*;

    fn app() -> App {
        App::new(Monitor::new(MonitorConfig::default()).unwrap())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn quit_and_help_keys() {
        let mut app = app();
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap(), Some(Action::Quit)));
        assert!(matches!(
            app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .unwrap(),
            Some(Action::Quit)
        ));

        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.help_visible);
        assert!(matches!(app.handle_key_event(key(KeyCode::Esc)).unwrap(), Some(Action::ToggleHelp)));
        assert!(app.handle_key_event(key(KeyCode::Char('x'))).unwrap().is_none());
    }

    #[tokio::test]
    async fn header_label_follows_connection_and_source() {
        let mut app = app();
        assert_eq!(app.display_status(), DisplayStatus::Disconnected);

        app.process_action(&Action::SnapshotUpdated(Box::new(NetworkMetricsSnapshot::fallback())))
            .unwrap();
        assert_eq!(app.display_status(), DisplayStatus::Pull);

        app.process_action(&Action::ConnectionChanged(true)).unwrap();
        assert_eq!(app.display_status(), DisplayStatus::Push);
    }

    #[tokio::test]
    async fn reconnect_clears_notification() {
        let mut app = app();
        app.process_action(&Action::Notify("push channel unavailable".into()))
            .unwrap();
        assert!(app.notification.is_some());
        app.process_action(&Action::ConnectionChanged(true)).unwrap();
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut app = app();
        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }
}
