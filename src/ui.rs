use crate::client::{
    AppSnapshot,
    SessionPhase,
};
use crate::history::{
    GameResult,
    HistoryEntry,
    Move,
    RoundOutcome,
};
use crate::node::OCTAS_PER_COIN;
use color_eyre::eyre::Result;
use crossterm::event::{
    self,
    Event,
    KeyCode,
    KeyEventKind,
};
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const INPUT_IDLE_SLEEP: Duration = Duration::from_millis(10);

pub enum UserEvent {
    Quit,
    NextMove,
    PrevMove,
    SelectMove(Move),
    Initialize,
    Play,
    CloseModal,
    Redraw,
}

pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState { terminal: None }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    // Single persistent Terminal to preserve buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| render(f, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Key events mapped to app events. Polls with a short timeout so the
/// refresh ticker keeps running on the current-thread runtime.
pub async fn next_event() -> Result<UserEvent> {
    loop {
        if event::poll(INPUT_POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(k) => {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }
                    match k.code {
                        KeyCode::Char('q') => return Ok(UserEvent::Quit),
                        KeyCode::Esc => return Ok(UserEvent::CloseModal),
                        KeyCode::Left | KeyCode::Char('h') => {
                            return Ok(UserEvent::PrevMove);
                        }
                        KeyCode::Right | KeyCode::Char('l') => {
                            return Ok(UserEvent::NextMove);
                        }
                        KeyCode::Char('1') | KeyCode::Char('r') => {
                            return Ok(UserEvent::SelectMove(Move::Rock));
                        }
                        KeyCode::Char('2') | KeyCode::Char('p') => {
                            return Ok(UserEvent::SelectMove(Move::Paper));
                        }
                        KeyCode::Char('3') | KeyCode::Char('s') => {
                            return Ok(UserEvent::SelectMove(Move::Scissors));
                        }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            return Ok(UserEvent::Play);
                        }
                        KeyCode::Char('i') => return Ok(UserEvent::Initialize),
                        _ => continue,
                    }
                }
                Event::Resize(_, _) => return Ok(UserEvent::Redraw),
                _ => continue,
            }
        } else {
            tokio::time::sleep(INPUT_IDLE_SLEEP).await;
        }
    }
}

fn render(f: &mut Frame, snap: &AppSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, rows[0], snap);
    match snap.phase {
        SessionPhase::Disconnected => render_welcome(f, rows[1]),
        SessionPhase::Uninitialized => render_initialize_prompt(f, rows[1]),
        SessionPhase::Initialized => render_board(f, rows[1], snap),
    }
    render_footer(f, rows[2], snap);

    if let Some(outcome) = &snap.last_round {
        render_result_modal(f, outcome);
    }
}

fn render_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut right = vec![Span::styled(
        format!(" {} ", snap.network),
        Style::default().fg(Color::Blue),
    )];
    if let Some(account) = &snap.account {
        right.push(Span::raw(" | "));
        right.push(Span::styled(
            account.short(),
            Style::default().fg(Color::Gray),
        ));
    }
    right.push(Span::raw(" | "));
    right.push(Span::styled(
        match snap.balance_octas {
            Some(octas) => {
                format!("{:.2} APT", octas as f64 / OCTAS_PER_COIN as f64)
            }
            None => String::from("-.-- APT"),
        },
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(Line::from(right))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " Neosmic RPS ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
        );
    f.render_widget(header, area);
}

fn render_welcome(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to Neosmic RPS!",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Waiting for a wallet connection."),
        Line::from("Connect your wallet to play Rock Paper Scissors against the AI."),
    ];
    let welcome = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(welcome, area);
}

fn render_initialize_prompt(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from("No game found for this account."),
        Line::from(""),
        Line::from(Span::styled(
            "Press [i] to initialize a new game on-chain.",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    let prompt = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(prompt, area);
}

fn render_board(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_move_picker(f, columns[0], snap);
    render_side_panel(f, columns[1], snap);
}

fn render_move_picker(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" Choose your move ");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(1)])
        .split(inner);
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);

    for (idx, mv) in Move::ALL.into_iter().enumerate() {
        let selected = mv == snap.selected_move;
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cell = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(mv.label(), style)),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if selected {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                }),
        );
        f.render_widget(cell, cells[idx]);
    }

    let hint = Paragraph::new(vec![
        Line::from(""),
        Line::from("←/→ select | Enter play | q quit"),
    ])
    .alignment(Alignment::Center);
    f.render_widget(hint, rows[1]);
}

fn render_side_panel(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    render_stat_row(
        f,
        rows[0],
        &[
            ("Player Score", snap.game_state.player_wins, Color::Yellow),
            ("AI Score", snap.game_state.ai_wins, Color::Red),
        ],
    );
    render_stat_row(
        f,
        rows[1],
        &[
            ("Draws", snap.game_state.draws, Color::Cyan),
            ("Games Played", snap.game_state.games_played, Color::Magenta),
        ],
    );

    let win_rate = snap.game_state.win_rate();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Win Rate "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(win_rate.clamp(0.0, 1.0))
        .label(format!("{:.1}%", win_rate * 100.0));
    f.render_widget(gauge, rows[2]);

    render_history(f, rows[3], &snap.history);
}

fn render_stat_row(f: &mut Frame, area: Rect, stats: &[(&str, u64, Color)]) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    for (idx, (title, value, color)) in stats.iter().enumerate() {
        let stat = Paragraph::new(Span::styled(
            value.to_string(),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} ")),
        );
        f.render_widget(stat, cells[idx]);
    }
}

fn render_history(f: &mut Frame, area: Rect, history: &[HistoryEntry]) {
    let items: Vec<ListItem> = if history.is_empty() {
        vec![ListItem::new("No games played yet.")]
    } else {
        history
            .iter()
            .map(|entry| {
                let color = match entry.result {
                    GameResult::PlayerWins => Color::Green,
                    GameResult::AiWins => Color::Red,
                    GameResult::Draw => Color::Yellow,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("#{:<4}", entry.sequence_number),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(format!(
                        "You: {}  AI: {}  ",
                        pad_label(entry.player_move),
                        pad_label(entry.ai_move),
                    )),
                    Span::styled(entry.result.label(), Style::default().fg(color)),
                ]))
            })
            .collect()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Recent Games "),
    );
    f.render_widget(list, area);
}

// Pads move labels to the widest one so history columns line up.
fn pad_label(mv: Move) -> String {
    let widest = Move::ALL
        .iter()
        .map(|m| m.label().width())
        .max()
        .unwrap_or(0);
    let label = mv.label();
    format!("{label}{}", " ".repeat(widest - label.width()))
}

fn render_footer(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut spans = vec![Span::raw(snap.status.clone())];
    if let Some(last_error) = snap.errors.first() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            last_error.clone(),
            Style::default().fg(Color::Red),
        ));
    }
    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(footer, area);
}

fn render_result_modal(f: &mut Frame, outcome: &RoundOutcome) {
    let area = centered_rect(40, 40, f.area());
    f.render_widget(Clear, area);

    let result_color = match outcome.result {
        GameResult::PlayerWins => Color::Green,
        GameResult::AiWins => Color::Red,
        GameResult::Draw => Color::Yellow,
    };
    let text = vec![
        Line::from(""),
        Line::from(format!("Your move: {}", outcome.player_move)),
        Line::from(format!("AI's move: {}", outcome.ai_move)),
        Line::from(""),
        Line::from(Span::styled(
            outcome.result.label(),
            Style::default()
                .fg(result_color)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let modal = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Game Result "),
        );
    f.render_widget(modal, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}
