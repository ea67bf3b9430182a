use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::io;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::Score;
use crate::config::LeaderboardConfig;
use crate::error::ReviewError;
use crate::leaderboard::Vibe;
use crate::pipeline::{ReviewOutcome, ReviewPipeline, Session};
use crate::window::ListWindow;

type PendingReview = oneshot::Receiver<Result<ReviewOutcome, ReviewError>>;

/// Application state for the TUI.
pub struct App {
    pipeline: ReviewPipeline,
    session: Session,
    runtime: Handle,
    input: String,
    pending: Option<PendingReview>,
    error: Option<String>,
    should_quit: bool,
    show_help: bool,
    result_scroll: u16,
    row_height: u32,
    buffer_rows: usize,
    /// Leaderboard scroll offset, in row-height units.
    board_scroll: u64,
    /// Leaderboard viewport height from the last frame.
    board_viewport: u32,
    status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app. Reviews are spawned on `runtime`.
    pub fn new(
        pipeline: ReviewPipeline,
        board: &LeaderboardConfig,
        runtime: Handle,
        initial_url: Option<String>,
    ) -> Self {
        Self {
            pipeline,
            session: Session::new(),
            runtime,
            input: initial_url.unwrap_or_default(),
            pending: None,
            error: None,
            should_quit: false,
            show_help: false,
            result_scroll: 0,
            row_height: board.row_height.max(1),
            buffer_rows: board.buffer_rows,
            board_scroll: 0,
            board_viewport: 0,
            status_message: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a review of the current input. Ignored while one is in flight.
    fn submit(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.error = None;
        self.result_scroll = 0;
        self.session.clear_current();

        let (tx, rx) = oneshot::channel();
        let pipeline = self.pipeline.clone();
        let url = self.input.trim().to_string();
        self.runtime.spawn(async move {
            let _ = tx.send(pipeline.run(&url).await);
        });
        self.pending = Some(rx);
    }

    /// Apply a finished review, if any.
    fn poll_pending(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(Ok(outcome)) => {
                self.pending = None;
                let repo = outcome.repo.clone();
                self.session.apply(outcome);
                self.status_message = Some((format!("Reviewed {repo}"), Instant::now()));
            }
            Ok(Err(e)) => {
                self.pending = None;
                tracing::warn!(%e, "review failed");
                self.error = Some(e.user_message());
            }
            Err(TryRecvError::Closed) => {
                self.pending = None;
                self.error = Some("The review stopped unexpectedly. Please try again.".to_string());
            }
        }
    }

    /// Handle keyboard input.
    fn handle_input(&mut self, key: event::KeyEvent) {
        if self.show_help {
            // Any key closes help
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.result_scroll = self.result_scroll.saturating_add(10);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.result_scroll = self.result_scroll.saturating_sub(10);
            }
            KeyCode::Char('?') if self.input.is_empty() => self.show_help = true,
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::F(1) => self.session.give_feedback(Vibe::Vibe),
            KeyCode::F(2) => self.session.give_feedback(Vibe::Hmm),
            KeyCode::F(3) => self.session.give_feedback(Vibe::NotMyVibe),
            KeyCode::Down => self.scroll_board(1),
            KeyCode::Up => self.scroll_board(-1),
            KeyCode::PageDown => {
                let page = i64::from(self.board_viewport / self.row_height).max(1);
                self.scroll_board(page);
            }
            KeyCode::PageUp => {
                let page = i64::from(self.board_viewport / self.row_height).max(1);
                self.scroll_board(-page);
            }
            _ => {}
        }
    }

    /// Scroll the leaderboard by `rows`, clamped to the list.
    fn scroll_board(&mut self, rows: i64) {
        let h = u64::from(self.row_height);
        let total = self.session.leaderboard().len() as u64 * h;
        let max = total.saturating_sub(u64::from(self.board_viewport));
        let delta = rows.unsigned_abs() * h;
        self.board_scroll = if rows < 0 {
            self.board_scroll.saturating_sub(delta)
        } else {
            self.board_scroll.saturating_add(delta).min(max)
        };
    }

    /// Render the UI.
    fn render(&mut self, frame: &mut Frame) {
        // Expire old status messages
        let expired = self
            .status_message
            .as_ref()
            .map(|(_, time)| time.elapsed() >= Duration::from_secs(3))
            .unwrap_or(false);
        if expired {
            self.status_message = None;
        }

        if self.show_help {
            self.render_help(frame);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(frame.area());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[2]);

        let side_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(main_chunks[1]);

        // Borders and header row
        self.board_viewport = u32::from(side_chunks[1].height.saturating_sub(3));

        self.render_input(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.render_result(frame, main_chunks[0]);
        self.render_tally(frame, side_chunks[0]);
        self.render_leaderboard(frame, side_chunks[1]);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let title = if self.is_pending() {
            "GitHub repo URL (Smashing...)"
        } else {
            "GitHub repo URL (Enter to Smash Code)"
        };
        let text = if self.input.is_empty() {
            Span::styled(
                "Paste your GitHub repo URL here...",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(self.input.as_str())
        };
        let paragraph = Paragraph::new(Line::from(text))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if self.is_pending() {
            (
                "Smashing code... checking vibes...".to_string(),
                Style::default().fg(Color::Cyan),
            )
        } else if let Some(err) = &self.error {
            (
                err.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else if let Some((msg, _)) = &self.status_message {
            (msg.clone(), Style::default().fg(Color::Green))
        } else {
            (
                "Enter: review  F1/F2/F3: vibe  Up/Down/PgUp/PgDn: leaderboard  Ctrl+d/u: scroll  ?: help  Esc: quit"
                    .to_string(),
                Style::default(),
            )
        };

        let paragraph = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_result(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Review");
        let Some(outcome) = self.session.current() else {
            let paragraph = Paragraph::new("No review yet").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let result = &outcome.result;
        let mut lines = vec![
            Line::from(Span::styled(
                format!("{}  {}", outcome.repo, result.overall_score.headline()),
                Style::default()
                    .fg(score_color(result.overall_score))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Reported: {}  Rule-derived: {}",
                outcome.score.reported, outcome.score.derived
            )),
            Line::from(format!("Files: {}", outcome.files.join(", "))),
            Line::from(""),
        ];

        if !result.good_vibes.is_empty() {
            lines.push(Line::from(Span::styled(
                "Good Vibes Checklist",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for check in &result.good_vibes {
                let (mark, color) = if check.passed {
                    ("✓", Color::Green)
                } else {
                    ("✗", Color::Red)
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {mark} "), Style::default().fg(color)),
                    Span::raw(check.check.as_str()),
                ]));
            }
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            "Detailed Breakdown",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        if result.findings.is_empty() {
            lines.push(Line::from("No vulnerabilities found. That's a clean vibe!"));
        }
        for finding in &result.findings {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", finding.severity.badge()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{}: ", finding.category.label()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(finding.description.as_str()),
            ]));
            lines.push(Line::from(format!("    Why: {}", finding.impact)));
            lines.push(Line::from(format!("    Fix: {}", finding.remediation)));
        }

        lines.push(Line::from(""));
        let feedback: Vec<Span> = Vibe::ALL
            .iter()
            .zip(["F1", "F2", "F3"])
            .map(|(&vibe, key)| {
                let style = if self.session.feedback() == Some(vibe) {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else {
                    Style::default()
                };
                Span::styled(format!(" {key} {} ", vibe.label()), style)
            })
            .collect();
        lines.push(Line::from(feedback));

        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.result_scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_tally(&self, frame: &mut Frame, area: Rect) {
        let tally = self.session.tally();
        let colors = [Color::Green, Color::Yellow, Color::Red];
        let spans: Vec<Span> = Vibe::ALL
            .iter()
            .zip(colors)
            .map(|(&vibe, color)| {
                Span::styled(
                    format!(" {} {} ", vibe.label(), tally.count(vibe)),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Overall Vibe Check"),
        );
        frame.render_widget(paragraph, area);
    }

    /// Render only the windowed slice of the leaderboard.
    fn render_leaderboard(&self, frame: &mut Frame, area: Rect) {
        let entries = self.session.leaderboard().entries();
        let window = ListWindow::compute(
            entries.len(),
            self.row_height,
            self.buffer_rows,
            self.board_scroll,
            self.board_viewport,
        );
        let first_visible = (self.board_scroll / u64::from(self.row_height)) as usize;
        let row_height = u16::try_from(self.row_height).unwrap_or(u16::MAX);

        let rows: Vec<Row> = entries[window.range()]
            .iter()
            .map(|entry| {
                Row::new(vec![
                    Cell::from(entry.repo_key.clone()),
                    Cell::from(entry.review_count.to_string()),
                    Cell::from(entry.bugs_found.to_string()),
                    Cell::from(Span::styled(
                        "■",
                        Style::default().fg(score_color(entry.last_score)),
                    )),
                ])
                .height(row_height)
            })
            .collect();

        let widths = [
            Constraint::Percentage(55),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ];

        let header = Row::new(vec!["Repo", "Reviews", "Bugs", "Vibe"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let title = if entries.is_empty() {
            "Top Smashed Repos".to_string()
        } else {
            let page = (self.board_viewport / self.row_height) as usize;
            let last_visible = (first_visible + page).min(entries.len());
            format!(
                "Top Smashed Repos ({}-{} of {})",
                first_visible.min(entries.len()) + 1,
                last_visible,
                entries.len()
            )
        };

        let table = Table::new(rows, widths)
            .block(Block::default().borders(Borders::ALL).title(title))
            .header(header);

        // Buffer rows above the viewport are materialized but scrolled out of view.
        let mut state = TableState::default()
            .with_offset(first_visible.saturating_sub(window.range().start));
        frame.render_stateful_widget(table, area, &mut state);
    }

    /// Render the help overlay.
    fn render_help(&self, frame: &mut Frame) {
        let help_text = [
            "Vibe Review - Keyboard Shortcuts",
            "",
            "Review:",
            "  type / paste  - Repository URL",
            "  Enter         - Start review (one at a time)",
            "",
            "Feedback:",
            "  F1            - Vibe!",
            "  F2            - Hmm...",
            "  F3            - Not my vibe",
            "  (press again to take it back)",
            "",
            "Scrolling:",
            "  Up / Down     - Leaderboard row",
            "  PgUp / PgDn   - Leaderboard page",
            "  Ctrl+d/u      - Review details",
            "",
            "Other:",
            "  ?             - Show this help (with empty input)",
            "  Esc / Ctrl+c  - Quit",
            "",
            "Press any key to close this help",
        ];

        let text = Text::from(help_text.iter().map(|&s| Line::from(s)).collect::<Vec<_>>());

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });

        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

fn score_color(score: Score) -> Color {
    match score {
        Score::Green => Color::Green,
        Score::Yellow => Color::Yellow,
        Score::Red => Color::Red,
    }
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Setup the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Launch the interactive review interface.
///
/// Must run outside the async executor's worker threads; reviews are
/// spawned on the app's runtime handle.
pub fn run_tui(mut app: App) -> Result<()> {
    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    // Main event loop
    let result = (|| -> Result<()> {
        loop {
            app.poll_pending();

            terminal
                .draw(|f| app.render(f))
                .context("Failed to draw frame")?;

            if app.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100)).context("Failed to poll events")?
                && let Event::Key(key) = event::read().context("Failed to read event")?
            {
                // Ignore key release events
                if key.kind == event::KeyEventKind::Press {
                    app.handle_input(key);
                }
            }
        }
        Ok(())
    })();

    // Restore terminal in all cases
    restore_terminal(&mut terminal)?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ReplayCapability;
    use crate::source::SourceSelector;
    use crate::{ReviewResult, score::check_reported};
    use crossterm::event::KeyEvent;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn app(rt: &tokio::runtime::Runtime) -> App {
        let selector = SourceSelector::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let pipeline = ReviewPipeline::new(selector, Arc::new(ReplayCapability::new("{}")), "m");
        App::new(pipeline, &LeaderboardConfig::default(), rt.handle().clone(), None)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn outcome(repo: &str) -> ReviewOutcome {
        let result = ReviewResult {
            overall_score: Score::Yellow,
            good_vibes: vec![],
            findings: vec![],
        };
        ReviewOutcome {
            repo: repo.to_string(),
            files: vec!["a.js".to_string()],
            score: check_reported(&result),
            result,
        }
    }

    #[test]
    fn typing_and_backspace_edit_input() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        for c in "abc".chars() {
            app.handle_input(key(KeyCode::Char(c)));
        }
        app.handle_input(key(KeyCode::Backspace));
        assert_eq!(app.input, "ab");
    }

    #[test]
    fn question_mark_opens_help_only_with_empty_input() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        app.handle_input(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_input(key(KeyCode::Char('x')));
        assert!(!app.show_help);

        app.input = "https://github.com/a/b".to_string();
        app.handle_input(key(KeyCode::Char('?')));
        assert!(!app.show_help);
        assert!(app.input.ends_with('?'));
    }

    #[test]
    fn failed_review_surfaces_user_message() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        app.input = "https://gitlab.com/a/b".to_string();
        app.handle_input(key(KeyCode::Enter));
        assert!(app.is_pending());

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.is_pending() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            app.poll_pending();
        }
        assert!(!app.is_pending());
        assert_eq!(
            app.error.as_deref(),
            Some("Invalid GitHub repository URL. Please use a format like https://github.com/owner/repo.")
        );
        assert!(app.session.leaderboard().is_empty());
    }

    #[test]
    fn leaderboard_scroll_is_clamped() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        for i in 0..30 {
            app.session.apply(outcome(&format!("owner/repo-{i}")));
        }
        app.board_viewport = 10;

        app.scroll_board(-3);
        assert_eq!(app.board_scroll, 0);
        app.handle_input(key(KeyCode::PageDown));
        assert_eq!(app.board_scroll, 10);
        app.scroll_board(100);
        assert_eq!(app.board_scroll, 20);
    }

    #[test]
    fn renders_windowed_leaderboard() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        for i in 0..40 {
            app.session.apply(outcome(&format!("owner/repo-{i:02}")));
        }
        app.session.clear_current();

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("owner/repo-00"));
        assert!(!screen.contains("owner/repo-39"));
        assert!(screen.contains("Top Smashed Repos (1-17 of 40)"));
        assert!(screen.contains("No review yet"));
    }

    #[test]
    fn feedback_keys_toggle_tally() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut app = app(&rt);
        app.session.apply(outcome("a/b"));
        app.handle_input(key(KeyCode::F(1)));
        app.handle_input(key(KeyCode::F(3)));
        assert_eq!(app.session.tally().count(Vibe::Vibe), 0);
        assert_eq!(app.session.tally().count(Vibe::NotMyVibe), 1);
    }
}
