use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tilemaze_core::{
    DoorColor, DoorSide, MoveOutcome, Position,
    arrow::{self, ARROW_MAZE_SIZE, ArrowMazeEngine, StepModifier, TileCategory},
    catalog,
    door::{CellFeature, DoorMazeEngine, Heading},
    explorer::{self, RandomExplorer},
};

/// Largest step size drawn by the step indicator.
const STEP_INDICATOR_LEN: isize = 10;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Which maze to play
    #[arg(value_enum, default_value_t = GameKind::Arrow)]
    game: GameKind,
    /// Arrow maze to load first
    #[arg(short, long, default_value_t = 1)]
    maze: u16,
    /// Let a random explorer play
    #[arg(long)]
    autoplay: bool,
    /// Seed for the random explorer
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Delay between autoplay moves in milliseconds
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,
    /// Write logs to this file, filtered by RUST_LOG
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GameKind {
    Arrow,
    Door,
}

enum Game {
    Arrow {
        engine: ArrowMazeEngine,
        cursor: Position,
    },
    Door {
        engine: DoorMazeEngine,
    },
}

struct App {
    game: Game,
    /// Drives moves on each tick when autoplay is on.
    explorer: Option<RandomExplorer>,
    /// Last notable event, shown under the maze.
    status: String,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let game = match args.game {
            GameKind::Arrow => {
                let maze = catalog::arrow_maze(args.maze)
                    .with_context(|| format!("Failed to load arrow maze {}", args.maze))?;
                let cursor = maze.start();
                Game::Arrow {
                    engine: ArrowMazeEngine::new(maze),
                    cursor,
                }
            }
            GameKind::Door => {
                let maze = catalog::door_maze().context("Failed to load the door maze")?;
                Game::Door {
                    engine: DoorMazeEngine::new(maze),
                }
            }
        };

        Ok(App {
            game,
            explorer: args.autoplay.then(|| RandomExplorer::new(args.seed)),
            status: String::new(),
            should_quit: false,
        })
    }

    /// Lets the explorer make one move.
    fn tick(&mut self) {
        let Some(walker) = self.explorer.as_mut() else {
            return;
        };
        let outcome = match &mut self.game {
            Game::Arrow { engine, cursor } => {
                let outcome = explorer::step(engine, walker);
                *cursor = engine.position();
                outcome
            }
            Game::Door { engine } => explorer::step(engine, walker),
        };
        match outcome {
            Some(outcome) => self.show(outcome),
            None if !self.is_terminal() => self.status = "The explorer is stuck.".to_string(),
            None => {}
        }
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char(c @ '1'..='9') => {
                if let Some(id) = c.to_digit(10) {
                    self.select_maze(id as u16);
                }
            }
            _ => {}
        }

        let outcome = match &mut self.game {
            Game::Door { engine } => match code {
                KeyCode::Up => Some(engine.request_move(Heading::Up)),
                KeyCode::Down => Some(engine.request_move(Heading::Down)),
                KeyCode::Left => Some(engine.request_move(Heading::Left)),
                KeyCode::Right => Some(engine.request_move(Heading::Right)),
                _ => None,
            },
            Game::Arrow { engine, cursor } => match code {
                KeyCode::Up => {
                    cursor.y = cursor.y.saturating_sub(1);
                    None
                }
                KeyCode::Down => {
                    cursor.y = (cursor.y + 1).min(ARROW_MAZE_SIZE - 1);
                    None
                }
                KeyCode::Left => {
                    cursor.x = cursor.x.saturating_sub(1);
                    None
                }
                KeyCode::Right => {
                    cursor.x = (cursor.x + 1).min(ARROW_MAZE_SIZE - 1);
                    None
                }
                KeyCode::Enter | KeyCode::Char(' ') if engine.maze().is_selectable(*cursor) => {
                    Some(engine.request_move(*cursor))
                }
                _ => None,
            },
        };
        if let Some(outcome) = outcome {
            self.show(outcome);
        }
    }

    /// Updates the status line. Refused moves change nothing on screen.
    fn show(&mut self, outcome: MoveOutcome) {
        let Some(report) = outcome.report() else {
            return;
        };
        if report.terminal {
            self.status = "You win! Press 'r' to play again.".to_string();
        } else if let Some(change) = report.door_changed {
            self.status = format!(
                "{} door slides; its {} end is open.",
                color_name(change.color),
                side_name(change.side)
            );
        } else {
            self.status.clear();
        }
    }

    fn select_maze(&mut self, id: u16) {
        let Game::Arrow { engine, cursor } = &mut self.game else {
            return;
        };
        match catalog::arrow_maze(id) {
            Ok(maze) => {
                engine.load_maze(maze);
                *cursor = engine.position();
                self.status = format!("Maze {id}");
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn reset(&mut self) {
        match &mut self.game {
            Game::Arrow { engine, cursor } => {
                engine.reset();
                *cursor = engine.position();
            }
            Game::Door { engine } => engine.reset(),
        }
        self.status.clear();
    }

    fn is_terminal(&self) -> bool {
        match &self.game {
            Game::Arrow { engine, .. } => engine.is_terminal(),
            Game::Door { engine } => engine.is_terminal(),
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    info!("Starting {:?} maze", args.game);

    // Create the application state before touching the terminal so load errors print normally
    let mut app = App::new(&args)?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Sends log output to `path` when given; otherwise logging stays off so the
/// alternate screen is not disturbed.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Area for the maze
            Constraint::Length(3), // Area for engine state
            Constraint::Length(2), // Area for status/help
        ])
        .split(frame.area());

    match &app.game {
        Game::Arrow { engine, cursor } => {
            render_arrow_maze(frame, main_layout[0], engine, *cursor);
            render_step_size(frame, main_layout[1], engine.step_size());
        }
        Game::Door { engine } => {
            render_door_maze(frame, main_layout[0], engine);
            render_doors(frame, main_layout[1], engine);
        }
    }

    let help = match app.game {
        Game::Arrow { .. } => "Arrows: cursor  Enter: move  1-3: maze  r: restart  q: quit",
        Game::Door { .. } => "Arrows: move  r: restart  q: quit",
    };
    let text = if app.status.is_empty() {
        help.to_string()
    } else {
        format!("{}  |  {}", app.status, help)
    };
    let help_text = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn arrow_glyph(direction: arrow::Direction) -> (usize, usize, &'static str) {
    // (row, column, glyph) inside a 3x3 tile
    match direction {
        arrow::Direction::NorthWest => (0, 0, "↖"),
        arrow::Direction::North => (0, 1, "↑"),
        arrow::Direction::NorthEast => (0, 2, "↗"),
        arrow::Direction::West => (1, 0, "←"),
        arrow::Direction::East => (1, 2, "→"),
        arrow::Direction::SouthWest => (2, 0, "↙"),
        arrow::Direction::South => (2, 1, "↓"),
        arrow::Direction::SouthEast => (2, 2, "↘"),
    }
}

/// Renders the arrow maze, three text rows per tile row.
fn render_arrow_maze(frame: &mut Frame, area: Rect, engine: &ArrowMazeEngine, cursor: Position) {
    let maze = engine.maze();
    let grid = maze.grid();
    let mut lines: Vec<Line> = Vec::with_capacity(grid.height() * 3);

    for y in 0..grid.height() {
        let mut rows: [Vec<Span>; 3] = Default::default();
        for x in 0..grid.width() {
            let pos = Position { x, y };
            let Some(cell) = grid.get(x, y) else {
                continue;
            };

            let mut glyphs = [[" "; 3]; 3];
            for direction in cell.directions() {
                let (row, col, glyph) = arrow_glyph(direction);
                glyphs[row][col] = glyph;
            }
            glyphs[1][1] = if pos == engine.position() {
                "@"
            } else if cell.is_goal() {
                "*"
            } else {
                match cell.modifier() {
                    StepModifier::Decrement => "-",
                    StepModifier::Increment => "+",
                    StepModifier::None => "·",
                }
            };

            let background = if pos == engine.position() {
                Color::Red
            } else {
                match cell.category() {
                    TileCategory::Blue => Color::Blue,
                    TileCategory::Green => Color::Green,
                    TileCategory::Interior => Color::Reset,
                }
            };
            let foreground = match cell.modifier() {
                StepModifier::Decrement => Color::Yellow,
                StepModifier::Increment => Color::LightRed,
                StepModifier::None => Color::Black,
            };
            let mut style = Style::default().fg(foreground).bg(background);
            if pos == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            for (row, spans) in rows.iter_mut().enumerate() {
                spans.push(Span::styled(glyphs[row].concat(), style));
            }
        }
        lines.extend(rows.into_iter().map(Line::from));
    }

    let title = format!("Arrow Maze {}", maze.id());
    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(maze_paragraph, area);
}

/// Renders the step size as a row of filled cells.
fn render_step_size(frame: &mut Frame, area: Rect, step_size: isize) {
    let mut spans = vec![Span::raw(format!("Step size: {step_size:>2}  "))];
    for i in 1..=STEP_INDICATOR_LEN {
        let span = if i <= step_size {
            let color = if i % 2 == 0 { Color::Blue } else { Color::Green };
            Span::styled("■ ", Style::default().fg(color))
        } else {
            Span::styled("□ ", Style::default().fg(Color::DarkGray))
        };
        spans.push(span);
    }
    let widget = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn door_color(color: DoorColor) -> Color {
    match color {
        DoorColor::Red => Color::Red,
        DoorColor::Green => Color::Green,
        DoorColor::Cyan => Color::Cyan,
        DoorColor::Magenta => Color::Magenta,
    }
}

fn color_name(color: DoorColor) -> &'static str {
    match color {
        DoorColor::Red => "Red",
        DoorColor::Green => "Green",
        DoorColor::Cyan => "Cyan",
        DoorColor::Magenta => "Magenta",
    }
}

fn side_name(side: DoorSide) -> &'static str {
    match side {
        DoorSide::Left => "left",
        DoorSide::Right => "right",
    }
}

/// Renders the door maze one text row per cell row.
///
/// Side walls are drawn between cells and bottom walls as underlines.
fn render_door_maze(frame: &mut Frame, area: Rect, engine: &DoorMazeEngine) {
    let grid = engine.maze().grid();
    let mut lines: Vec<Line> = Vec::with_capacity(grid.height());

    for y in 0..grid.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.width() * 2 + 1);
        for x in 0..grid.width() {
            let pos = Position { x, y };
            let Some(cell) = grid.get(x, y) else {
                continue;
            };
            let previous_right = x > 0 && grid.get(x - 1, y).is_some_and(|c| c.walls.right);
            let separator = if cell.walls.left || previous_right { "│" } else { " " };
            spans.push(Span::raw(separator));

            let (glyph, mut style) = if pos == engine.position() {
                ("@", Style::default().fg(Color::White).bold())
            } else if cell.exit {
                ("E", Style::default().fg(Color::Yellow).bold())
            } else {
                match cell.feature {
                    Some(CellFeature::Switch { color, side }) => {
                        let glyph = if side == DoorSide::Left { "<" } else { ">" };
                        (glyph, Style::default().fg(door_color(color)))
                    }
                    Some(CellFeature::Door { color, .. }) => {
                        let glyph = if engine.door_cell_open(pos) == Some(true) {
                            "░"
                        } else {
                            "█"
                        };
                        (glyph, Style::default().fg(door_color(color)))
                    }
                    None => (" ", Style::default()),
                }
            };
            if cell.walls.bottom {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            spans.push(Span::styled(glyph, style));
        }
        let last_right = grid
            .get(grid.width().saturating_sub(1), y)
            .is_some_and(|c| c.walls.right);
        spans.push(Span::raw(if last_right { "│" } else { " " }));
        lines.push(Line::from(spans));
    }

    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Sliding Doors").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(maze_paragraph, area);
}

/// Renders the open side of every door.
fn render_doors(frame: &mut Frame, area: Rect, engine: &DoorMazeEngine) {
    let spans: Vec<Span> = engine
        .maze()
        .doors()
        .flat_map(|track| {
            let side = engine.door_state(track.color);
            let closed = side_name(side.flipped());
            vec![
                Span::styled(
                    format!("{} ", color_name(track.color)),
                    Style::default().fg(door_color(track.color)).bold(),
                ),
                Span::raw(format!("open {}, closed {}   ", side_name(side), closed)),
            ]
        })
        .collect();
    let widget = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().title("Doors").borders(Borders::ALL));
    frame.render_widget(widget, area);
}
