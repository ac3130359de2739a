use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, info, warn};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use verse_render::{
    Ari, HighlightInfo, HighlightRange, LogReporter, NoticeReceiver, NoticeSender, RenderedVerse,
    Settings, SourceLinkFactory, VerseRenderer,
    display::{NumberGutter, VerseLines, visible_width},
    logger::{init_logger, parse_level},
    notice_channel,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const HIGHLIGHT_COLOR: u32 = 0xffff00;
const USAGE: &str = "Usage: verse-view [--plain] [--checked] [--indent-extra <n>] \
                     [--log-file <path>] [--log-level <error|warn|info|debug>] <verses.txt>";

fn main() -> Result<()> {
    run()
}

#[derive(Debug, PartialEq)]
struct Options {
    path: PathBuf,
    plain: bool,
    checked: bool,
    indent_extra: Option<u16>,
    log_file: Option<PathBuf>,
    log_level: LevelFilter,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut path = None;
    let mut plain = false;
    let mut checked = false;
    let mut indent_extra = None;
    let mut log_file = None;
    let mut log_level = LevelFilter::Info;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--plain" => plain = true,
            "--checked" => checked = true,
            "--indent-extra" => {
                let value = args.next().context("--indent-extra needs a value")?;
                let extra = value
                    .parse::<u16>()
                    .with_context(|| format!("invalid --indent-extra value {value:?}"))?;
                indent_extra = Some(extra);
            }
            "--log-file" => {
                let value = args.next().context("--log-file needs a path")?;
                log_file = Some(PathBuf::from(value));
            }
            "--log-level" => {
                let value = args.next().context("--log-level needs a value")?;
                log_level = match parse_level(&value) {
                    Some(level) => level,
                    None => bail!("unknown log level {value:?}"),
                };
            }
            "-h" | "--help" => return Ok(None),
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => path = Some(PathBuf::from(other)),
        }
    }

    Ok(path.map(|path| Options {
        path,
        plain,
        checked,
        indent_extra,
        log_file,
        log_level,
    }))
}

fn run() -> Result<()> {
    let Some(options) = parse_args(env::args().skip(1))? else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    init_logger(options.log_file.as_deref(), options.log_level)?;

    let verses = load_verses(&options.path)?;
    info!("loaded {} verses from {}", verses.len(), options.path.display());

    let mut settings = Settings::default();
    if let Some(extra) = options.indent_extra {
        settings.indent_spacing_extra = extra;
    }

    if options.plain {
        return print_plain(&verses, &settings);
    }

    let mut app = App::new(verses, settings, options.path, options.checked);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct VerseEntry {
    ari: Ari,
    label: String,
    text: String,
}

fn load_verses(path: &Path) -> Result<Vec<VerseEntry>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_verses(&content))
}

/// One verse per line, either `<ari-hex>\t<markup>` or bare markup. Bare
/// verses are numbered in reading order starting at chapter 1, verse 1.
fn parse_verses(content: &str) -> Vec<VerseEntry> {
    let mut bare = 0u32;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let ari = line
                .split_once('\t')
                .and_then(|(key, text)| parse_ari(key).map(|ari| (ari, text)));
            let (ari, text) = match ari {
                Some((ari, text)) => (ari, text),
                None => {
                    let chapter = 1 + bare / 255;
                    let verse = bare % 255 + 1;
                    bare += 1;
                    (Ari::from_raw(chapter << 8 | verse), line)
                }
            };
            VerseEntry {
                ari,
                label: ari.verse_label(),
                text: text.to_string(),
            }
        })
        .collect()
}

fn parse_ari(key: &str) -> Option<Ari> {
    let key = key.trim();
    let digits = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .filter(|raw| *raw <= 0x00ff_ffff)
        .map(Ari::from_raw)
}

fn print_plain(verses: &[VerseEntry], settings: &Settings) -> Result<()> {
    let reporter = LogReporter;
    let renderer = VerseRenderer::new(settings).with_reporter(Some(&reporter));
    for entry in verses {
        let verse = renderer
            .render(entry.ari, &entry.text, &entry.label)
            .with_context(|| format!("failed to render verse {}", entry.ari))?;
        println!("{}", verse.body());
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct ViewLayout {
    lines: Vec<Line<'static>>,
    /// First line of each verse, in verse order.
    verse_starts: Vec<usize>,
}

struct App {
    verses: Vec<VerseEntry>,
    settings: Settings,
    links: SourceLinkFactory,
    notices: NoticeSender,
    notice_rx: NoticeReceiver,
    highlights: HashMap<Ari, HighlightInfo>,
    checked: bool,
    file_path: PathBuf,
    scroll_top: usize,
    last_view_height: usize,
    verse_starts: Vec<usize>,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
}

impl App {
    fn new(verses: Vec<VerseEntry>, settings: Settings, path: PathBuf, checked: bool) -> Self {
        let (notices, notice_rx) = notice_channel();
        Self {
            verses,
            settings,
            links: SourceLinkFactory::new(0),
            notices,
            notice_rx,
            highlights: HashMap::new(),
            checked,
            file_path: path,
            scroll_top: 0,
            last_view_height: 1,
            verse_starts: Vec::new(),
            should_quit: false,
            status_message: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn gutter_width(&self) -> usize {
        self.verses
            .iter()
            .map(|entry| visible_width(&entry.label))
            .max()
            .unwrap_or(1)
    }

    fn render_verse<'l>(&self, entry: &'l VerseEntry) -> Option<RenderedVerse<'l>> {
        let highlight = self
            .highlights
            .get(&entry.ari)
            .map(|info| info as &dyn HighlightRange);
        let rendered = VerseRenderer::new(&self.settings)
            .with_checked(self.checked)
            .with_links(Some(&self.links))
            .with_reporter(Some(&self.notices))
            .with_highlight(highlight)
            .render(entry.ari, &entry.text, &entry.label);
        match rendered {
            Ok(verse) => Some(verse),
            Err(err) => {
                warn!("skipping verse {}: {err}", entry.ari);
                None
            }
        }
    }

    fn layout(&self, width: usize) -> ViewLayout {
        let gutter_width = self.gutter_width();
        let text_width = width.saturating_sub(gutter_width + 1).max(1);
        let mut lines = Vec::new();
        let mut verse_starts = Vec::with_capacity(self.verses.len());

        for entry in &self.verses {
            verse_starts.push(lines.len());
            let Some(verse) = self.render_verse(entry) else {
                lines.push(Line::from(entry.text.clone()));
                continue;
            };

            let mut text = VerseLines::new();
            let mut gutter = NumberGutter::new();
            verse.apply_to(Some(&mut text), Some(&mut gutter));

            for (idx, line) in text.lines(text_width, &self.settings).into_iter().enumerate() {
                let lead = if idx == 0 {
                    gutter.span(gutter_width, &self.settings)
                } else {
                    Span::raw(" ".repeat(gutter_width + 1))
                };
                let mut spans = Vec::with_capacity(line.spans.len() + 1);
                spans.push(lead);
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
        }

        ViewLayout {
            lines,
            verse_starts,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);

        let view_area = vertical[0];
        let status_area = vertical[1];

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(view_area);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let layout = self.layout(text_area.width.max(1) as usize);
        let total_lines = layout.lines.len();
        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        self.adjust_scroll(total_lines, viewport_height);
        self.verse_starts = layout.verse_starts;

        let paragraph = Paragraph::new(Text::from(layout.lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        let status_text = self.status_line(total_lines);
        let status_widget = Paragraph::new(Line::from(Span::styled(status_text, Style::default())))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, status_area);
    }

    fn status_line(&mut self, total_lines: usize) -> String {
        self.prune_status_message();
        let position = match self.top_verse() {
            Some(entry) => format!("{}:{}", entry.ari.chapter(), entry.ari.verse()),
            None => "-".to_string(),
        };
        if let Some((message, _)) = &self.status_message {
            return format!("{position} | {message}");
        }

        let mode = if self.checked { " | checked" } else { "" };
        format!(
            "{} | {} | Verses: {} | Lines: {}{} | c checked | h highlight | q quit",
            position,
            self.file_path.display(),
            self.verses.len(),
            total_lines,
            mode
        )
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn adjust_scroll(&mut self, total_lines: usize, viewport_height: usize) {
        let max_scroll = total_lines.saturating_sub(viewport_height.max(1));
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    /// Verse whose text is at the top of the view.
    fn top_verse(&self) -> Option<&VerseEntry> {
        let idx = self
            .verse_starts
            .partition_point(|start| *start <= self.scroll_top)
            .checked_sub(1)?;
        self.verses.get(idx)
    }

    fn toggle_highlight(&mut self) {
        let Some(ari) = self.top_verse().map(|entry| entry.ari) else {
            return;
        };
        if self.highlights.remove(&ari).is_none() {
            self.highlights.insert(ari, HighlightInfo::whole(HIGHLIGHT_COLOR));
        }
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return;
        };

        match (code, modifiers) {
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
                self.should_quit = true;
            }
            (KeyCode::Char('c'), _) => {
                self.checked = !self.checked;
            }
            (KeyCode::Char('h'), _) => {
                self.toggle_highlight();
            }
            (KeyCode::Up, _) => {
                self.scroll_top = self.scroll_top.saturating_sub(1);
            }
            (KeyCode::Down, _) => {
                self.scroll_top += 1;
            }
            (KeyCode::PageUp, _) => {
                self.scroll_top = self.scroll_top.saturating_sub(self.last_view_height.max(1));
            }
            (KeyCode::PageDown, _) => {
                self.scroll_top += self.last_view_height.max(1);
            }
            (KeyCode::Home, _) => {
                self.scroll_top = 0;
            }
            (KeyCode::End, _) => {
                self.scroll_top = usize::MAX;
            }
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        if let Some(notice) = self.notice_rx.take_latest() {
            let message = if notice.coalesced > 0 {
                format!("{} (+{} more)", notice.message, notice.coalesced)
            } else {
                notice.message
            };
            self.status_message = Some((message, notice.posted_at));
        }
        self.prune_status_message();
    }
}
