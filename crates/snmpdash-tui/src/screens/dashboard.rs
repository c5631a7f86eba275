//! Dashboard: the four metric views.
//!
//! ┌ IP Packets ─────────┐┌ TCP Connections ────┐
//! │ in  ████░░░░  2500K ││ 42 established      │
//! │ out ██░░░░░░  1499K ││ ▂▃▅▇█▇▅▃            │
//! └─────────────────────┘└─────────────────────┘
//! ┌ Protocols ──────────┐┌ Device Status ──────┐
//! │ UDP ÷100   ICMP in  ││ ● Online   1        │
//! └─────────────────────┘└─────────────────────┘

use std::collections::VecDeque;

use color_eyre::eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, Paragraph, Sparkline},
};

use snmpdash_core::{NetworkMetricsSnapshot, SnapshotSink, SnapshotSource};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::metrics_fmt::{PacketGauges, udp_hundreds};
use crate::widgets::status_indicator::flag_line;

/// TCP samples kept for the sparkline.
pub const TCP_HISTORY_LEN: usize = 120;

#[derive(Default)]
pub struct Dashboard {
    latest: Option<NetworkMetricsSnapshot>,
    tcp_history: VecDeque<u64>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&NetworkMetricsSnapshot> {
        self.latest.as_ref()
    }

    pub fn latest_source(&self) -> Option<SnapshotSource> {
        self.latest.as_ref().map(|s| s.source)
    }

    // ── Views ────────────────────────────────────────────────────────

    fn panel(title: String) -> Block<'static> {
        Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default())
    }

    fn waiting(frame: &mut Frame, block: Block<'_>, area: Rect) {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new("  Waiting for data…").style(theme::key_hint()), inner);
    }

    fn render_packets(&self, frame: &mut Frame, area: Rect) {
        let Some(snapshot) = self.latest.as_ref() else {
            Self::waiting(frame, Self::panel(" IP Packets ".into()), area);
            return;
        };
        let g = PacketGauges::new(&snapshot.packets);

        let block = Self::panel(format!(" IP Packets · total {}K ", g.total_k));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(" IP in").style(theme::text()), rows[0]);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(theme::IP_IN).bg(theme::BG_DARK))
                .percent(g.in_percent)
                .label(format!("{}K", g.in_k)),
            rows[1],
        );
        frame.render_widget(Paragraph::new(" IP out").style(theme::text()), rows[2]);
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(theme::IP_OUT).bg(theme::BG_DARK))
                .percent(g.out_percent)
                .label(format!("{}K", g.out_k)),
            rows[3],
        );
    }

    fn render_tcp(&self, frame: &mut Frame, area: Rect) {
        let block = Self::panel(" TCP Connections ".into());
        let Some(snapshot) = self.latest.as_ref() else {
            Self::waiting(frame, block, area);
            return;
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(inner);
        let summary = Line::from(vec![
            Span::styled(format!(" {}", snapshot.connections.tcp), theme::title_style()),
            Span::styled(" established  ", theme::text()),
            Span::styled(snapshot.connections.tcp_active.to_string(), theme::key_hint_key()),
            Span::styled(" active opens", theme::text()),
        ]);
        frame.render_widget(Paragraph::new(summary), rows[0]);

        // Newest samples on the right, as many as fit.
        let width = usize::from(rows[1].width);
        let skip = self.tcp_history.len().saturating_sub(width);
        let data: Vec<u64> = self.tcp_history.iter().skip(skip).copied().collect();
        frame.render_widget(
            Sparkline::default()
                .data(data)
                .style(Style::default().fg(theme::ELECTRIC_PURPLE)),
            rows[1],
        );
    }

    fn render_protocols(&self, frame: &mut Frame, area: Rect) {
        let block = Self::panel(" Protocols ".into());
        let Some(snapshot) = self.latest.as_ref() else {
            Self::waiting(frame, block, area);
            return;
        };

        let bars = [
            Bar::default()
                .value(udp_hundreds(snapshot.connections.udp))
                .label(Line::from("UDP ÷100"))
                .style(Style::default().fg(theme::NEON_CYAN)),
            Bar::default()
                .value(snapshot.packets.icmp_in)
                .label(Line::from("ICMP in"))
                .style(Style::default().fg(theme::ELECTRIC_YELLOW)),
        ];
        let chart = BarChart::default()
            .block(block)
            .data(BarGroup::default().bars(&bars))
            .bar_width(10)
            .bar_gap(4)
            .value_style(Style::default().fg(theme::BG_DARK).bg(theme::DIM_WHITE));
        frame.render_widget(chart, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Self::panel(" Device Status ".into());
        let Some(snapshot) = self.latest.as_ref() else {
            Self::waiting(frame, block, area);
            return;
        };
        let status = snapshot.device_status;
        let lines = vec![
            Line::from(""),
            flag_line("Online", status.online(), theme::SUCCESS_GREEN),
            flag_line("Warning", status.warning(), theme::ELECTRIC_YELLOW),
            flag_line("Offline", status.offline(), theme::ERROR_RED),
            Line::from(""),
            Line::from(vec![
                Span::styled(" ARP entries ", theme::key_hint()),
                Span::styled(snapshot.device_info.arp_entries.to_string(), theme::text()),
                Span::styled("   TTL ", theme::key_hint()),
                Span::styled(snapshot.device_info.ttl.to_string(), theme::text()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl SnapshotSink for Dashboard {
    fn update_snapshot(&mut self, snapshot: &NetworkMetricsSnapshot) {
        if self.tcp_history.len() == TCP_HISTORY_LEN {
            self.tcp_history.pop_front();
        }
        self.tcp_history.push_back(snapshot.connections.tcp);
        self.latest = Some(snapshot.clone());
    }
}

impl Component for Dashboard {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SnapshotUpdated(snapshot) = action {
            self.update_snapshot(snapshot);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
        let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[0]);
        let bottom =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[1]);

        self.render_packets(frame, top[0]);
        self.render_tcp(frame, top[1]);
        self.render_protocols(frame, bottom[0]);
        self.render_status(frame, bottom[1]);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use snmpdash_core::{TelemetryRecord, from_telemetry};

    use super::*;

    fn snapshot(tcp: &str) -> NetworkMetricsSnapshot {
        let records = vec![
            TelemetryRecord::reading("tcp_curr_estab", tcp),
            TelemetryRecord::reading("ip_in_receives", "2500000"),
            TelemetryRecord::reading("udp_in_datagrams", "1234"),
        ];
        from_telemetry(&records, SnapshotSource::Push)
    }

    fn screen_text(dashboard: &Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| dashboard.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn keeps_latest_snapshot_and_tcp_history() {
        let mut dashboard = Dashboard::new();
        dashboard.update_snapshot(&snapshot("3"));
        dashboard.update_snapshot(&snapshot("5"));

        assert_eq!(dashboard.latest().unwrap().connections.tcp, 5);
        assert_eq!(dashboard.tcp_history.iter().copied().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(dashboard.latest_source(), Some(SnapshotSource::Push));
    }

    #[test]
    fn history_is_bounded() {
        let mut dashboard = Dashboard::new();
        for n in 0..TCP_HISTORY_LEN + 10 {
            dashboard.update_snapshot(&snapshot(&n.to_string()));
        }
        assert_eq!(dashboard.tcp_history.len(), TCP_HISTORY_LEN);
        assert_eq!(dashboard.tcp_history.front().copied(), Some(10));
    }

    #[test]
    fn snapshot_action_updates_view() {
        let mut dashboard = Dashboard::new();
        let follow_up = dashboard
            .update(&Action::SnapshotUpdated(Box::new(snapshot("7"))))
            .unwrap();
        assert!(follow_up.is_none());
        assert_eq!(dashboard.latest().unwrap().connections.tcp, 7);
    }

    #[test]
    fn renders_waiting_state_before_data() {
        let text = screen_text(&Dashboard::new());
        assert!(text.contains("IP Packets"));
        assert!(text.contains("Waiting for data"));
    }

    #[test]
    fn renders_all_four_views() {
        let mut dashboard = Dashboard::new();
        dashboard.update_snapshot(&snapshot("42"));
        let text = screen_text(&dashboard);

        assert!(text.contains("IP Packets · total 2500K"), "{text}");
        assert!(text.contains("TCP Connections"));
        assert!(text.contains("42 established"));
        assert!(text.contains("Protocols"));
        assert!(text.contains("Device Status"));
        assert!(text.contains("Online"));
    }
}
