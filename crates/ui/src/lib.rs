//! ratatui-based UI.

use std::io::{self, Stdout};
use std::ops::ControlFlow;
use std::process::Child;
use std::time::{Duration, Instant};

use aikesif_application::{AppContext, AuthMode, Panel, SessionRequest, SessionWorker, ToggleOutcome};
use aikesif_core::{AuthError, CategoryFilter, Theme, Tool};
use anyhow::Context as _;
use chrono::Datelike as _;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

mod clipboard;
mod launcher;

use clipboard::{Clipboard, SystemClipboard};

const TICK: Duration = Duration::from_millis(100);
const TOAST_TTL: Duration = Duration::from_secs(4);
const CARD_HEIGHT: u16 = 7;
const DESCRIPTION_LINES: usize = 3;

const SETTINGS_MENU_THEME: usize = 0;
const SETTINGS_MENU_REMEMBER_SESSION: usize = 1;
const SETTINGS_MENU_PASSWORD_MIN_LEN: usize = 2;
const SETTINGS_MENU_ITEM_COUNT: usize = 3;

const HERO_BADGE: &str = " AI TRACKER 2025 ";
const HERO_TITLE: &str = "Burak TURGUT — AI Keşif Rehberi";
const HERO_TAGLINE: &str = "Eğitim ve verimlilik dünyasını değiştiren en güçlü 60+ yapay zeka aracını Burak TURGUT kürasyonuyla keşfedin.";
const SEARCH_PLACEHOLDER: &str = "Aracın adını veya kategorisini yazın...";

pub struct Ui<'a> {
    ctx: AppContext,
    worker: &'a SessionWorker,
    settings_panel: SettingsPanel,
    search: SearchInput,
    columns: usize,
    grid_scroll: usize,
    hit_areas: HitAreas,
    toast_since: Option<Instant>,
    launched: Vec<Child>,
    clipboard: Box<dyn Clipboard>,
}

impl<'a> Ui<'a> {
    pub fn new(mut ctx: AppContext, worker: &'a SessionWorker) -> Self {
        ctx.settings.normalize();
        Self {
            ctx,
            worker,
            settings_panel: SettingsPanel::default(),
            search: SearchInput::default(),
            columns: 1,
            grid_scroll: 0,
            hit_areas: HitAreas::default(),
            toast_since: None,
            launched: Vec::new(),
            clipboard: Box::new(SystemClipboard::default()),
        }
    }

    /// Runs until the user quits and hands back the final state.
    pub fn run(&mut self) -> anyhow::Result<AppContext> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);
        self.reap_launched();

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(self.ctx.clone()),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(_), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn accent_color(&self) -> Color {
        match self.ctx.settings.theme {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Yellow,
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let mut needs_redraw = true;

        loop {
            if self.pump_replies() {
                needs_redraw = true;
            }
            if self.expire_toast() {
                needs_redraw = true;
            }
            self.reap_launched();

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(TICK)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Mouse(mouse) => {
                    if self.handle_mouse(mouse) {
                        needs_redraw = true;
                    }
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }

                    needs_redraw = true;
                    if self.handle_key(key).is_break() {
                        info!("quit requested");
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn pump_replies(&mut self) -> bool {
        let replies = self.worker.drain();
        let changed = !replies.is_empty();
        for reply in replies {
            self.ctx.apply_reply(reply);
        }
        changed
    }

    fn expire_toast(&mut self) -> bool {
        match (&self.ctx.toast, self.toast_since) {
            (None, _) => {
                self.toast_since = None;
                false
            }
            (Some(_), None) => {
                self.toast_since = Some(Instant::now());
                false
            }
            (Some(_), Some(since)) if since.elapsed() >= TOAST_TTL => {
                self.ctx.toast = None;
                self.toast_since = None;
                true
            }
            _ => false,
        }
    }

    fn reap_launched(&mut self) {
        self.launched
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }

    fn handle_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ControlFlow::Break(());
        }

        if self.ctx.loading {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('q') => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            };
        }

        if self.ctx.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.ctx.dismiss_alert();
            }
            return ControlFlow::Continue(());
        }

        if self.settings_panel.open {
            self.handle_settings_panel_key(key);
            return ControlFlow::Continue(());
        }

        if self.ctx.detail.is_some() {
            self.handle_detail_key(key);
            return ControlFlow::Continue(());
        }

        match self.ctx.panel {
            Panel::Account => self.handle_account_key(key),
            Panel::Catalog if self.search.editing => {
                self.handle_search_key(key);
                ControlFlow::Continue(())
            }
            Panel::Catalog => self.handle_catalog_key(key),
        }
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ControlFlow::Break(()),
            KeyCode::Char('/') | KeyCode::Char('F') => {
                self.search.editing = true;
            }
            KeyCode::Tab => {
                self.ctx.select_category(self.ctx.category.next());
                self.grid_scroll = 0;
            }
            KeyCode::BackTab => {
                self.ctx.select_category(self.ctx.category.prev());
                self.grid_scroll = 0;
            }
            KeyCode::Left => self.ctx.select_prev(1),
            KeyCode::Right => self.ctx.select_next(1),
            KeyCode::Up => self.ctx.select_prev(self.columns),
            KeyCode::Down => self.ctx.select_next(self.columns),
            KeyCode::Enter => self.ctx.open_selected_details(),
            KeyCode::Char('f') => {
                if let Some(id) = self.ctx.selected_tool().map(|tool| tool.id.clone()) {
                    self.toggle_favorite(&id);
                }
            }
            KeyCode::Char('v') => {
                self.ctx.set_favorites_only(!self.ctx.favorites_only);
                self.grid_scroll = 0;
            }
            KeyCode::Char('c') => {
                if let Some(tool) = self.ctx.selected_tool().cloned() {
                    self.copy_link(&tool);
                }
            }
            KeyCode::Char('o') => {
                if let Some(tool) = self.ctx.selected_tool().cloned() {
                    self.open_link(&tool);
                }
            }
            KeyCode::Char('r') => {
                self.ctx.reset_filters();
                self.grid_scroll = 0;
            }
            KeyCode::Char('a') => self.ctx.open_account(),
            KeyCode::Char('h') => {
                self.ctx.go_home();
                self.grid_scroll = 0;
            }
            KeyCode::Char('s') => self.open_settings_panel(),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => {
                self.search.editing = false;
            }
            KeyCode::Backspace => self.ctx.pop_query_char(),
            KeyCode::Char('u') if ctrl => self.ctx.set_query(""),
            KeyCode::Char(ch) if !ctrl => {
                self.ctx.push_query_char(ch);
                self.grid_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let Some(tool) = self.ctx.detail_tool().cloned() else {
            self.ctx.close_details();
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.ctx.close_details(),
            KeyCode::Char('f') => self.toggle_favorite(&tool.id),
            KeyCode::Char('c') | KeyCode::Char('p') => self.copy_link(&tool),
            KeyCode::Char('o') => self.open_link(&tool),
            _ => {}
        }
    }

    fn handle_account_key(&mut self, key: KeyEvent) -> ControlFlow<()> {
        if self.ctx.is_signed_in() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('x') => self.sign_out(),
                KeyCode::Esc | KeyCode::Char('h') => self.ctx.go_home(),
                KeyCode::Char('s') => self.open_settings_panel(),
                KeyCode::Char('q') => return ControlFlow::Break(()),
                _ => {}
            }
            return ControlFlow::Continue(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.ctx.go_home(),
            KeyCode::Tab | KeyCode::Down => self.ctx.account.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.ctx.account.focus_prev(),
            KeyCode::F(2) => self.ctx.account.switch_mode(),
            KeyCode::Char('t') if ctrl => self.ctx.account.switch_mode(),
            KeyCode::Char('u') if ctrl => self.ctx.account.clear_focused(),
            KeyCode::Enter => self.submit_account(),
            KeyCode::Backspace => self.ctx.account.pop_char(),
            KeyCode::Char(ch) if !ctrl => self.ctx.account.push_char(ch),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn handle_settings_panel_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => {
                self.settings_panel.open = false;
            }
            KeyCode::Up => {
                self.settings_panel.selected = self.settings_panel.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.settings_panel.selected = (self.settings_panel.selected + 1)
                    .min(SETTINGS_MENU_ITEM_COUNT.saturating_sub(1));
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => {
                let settings = &mut self.ctx.settings;
                match self.settings_panel.selected {
                    SETTINGS_MENU_THEME => settings.cycle_theme(),
                    SETTINGS_MENU_REMEMBER_SESSION => {
                        settings.remember_session = !settings.remember_session;
                    }
                    SETTINGS_MENU_PASSWORD_MIN_LEN => {
                        settings.password_min_len = if key.code == KeyCode::Left {
                            settings.password_min_len.saturating_sub(1)
                        } else {
                            settings.password_min_len + 1
                        };
                        settings.normalize();
                    }
                    _ => {}
                }
                debug!(
                    theme = %settings.theme,
                    remember_session = settings.remember_session,
                    password_min_len = settings.password_min_len,
                    "settings changed"
                );
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let MouseEventKind::Down(MouseButton::Left) = mouse.kind else {
            return false;
        };
        if self.ctx.loading || self.ctx.alert.is_some() || self.settings_panel.open {
            return false;
        }

        let pos = Position::new(mouse.column, mouse.row);
        if self.ctx.detail.is_some() {
            if self.hit_areas.detail.is_some_and(|area| !area.contains(pos)) {
                self.ctx.close_details();
                return true;
            }
            return false;
        }

        if self.ctx.panel != Panel::Catalog {
            return false;
        }
        let hit = self
            .hit_areas
            .cards
            .iter()
            .find(|(area, _)| area.contains(pos))
            .map(|(_, idx)| *idx);
        let Some(idx) = hit else {
            return false;
        };
        self.ctx.selected = idx;
        self.ctx.open_selected_details();
        true
    }

    fn open_settings_panel(&mut self) {
        self.settings_panel.open = true;
        self.settings_panel.selected = 0;
    }

    fn toggle_favorite(&mut self, id: &str) {
        match self.ctx.toggle_favorite(id) {
            ToggleOutcome::AuthRequired => {
                debug!(tool = id, "favorite toggle needs sign in");
            }
            ToggleOutcome::Changed {
                ticket,
                favorites,
                added,
            } => {
                debug!(tool = id, added, ticket, "favorite toggled");
                if !self
                    .worker
                    .send(SessionRequest::SaveFavorites { ticket, favorites })
                {
                    self.ctx.favorites_saved(ticket, Err(worker_gone()));
                }
            }
        }
    }

    fn submit_account(&mut self) {
        let Some(request) = self.ctx.submit_account() else {
            return;
        };
        if !self.worker.send(request) {
            self.ctx.account.finish(Err(worker_gone()));
        }
    }

    fn sign_out(&mut self) {
        if !self.worker.send(SessionRequest::SignOut) {
            self.ctx.signed_out(Err(worker_gone()));
        }
    }

    fn copy_link(&mut self, tool: &Tool) {
        match self.clipboard.set_text(&tool.url) {
            Ok(()) => {
                debug!(tool = %tool.id, "link copied");
                self.ctx.toast = Some(format!("Bağlantı kopyalandı: {}", tool.url));
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "clipboard write failed");
                self.ctx.toast = Some(format!("Bağlantı kopyalanamadı: {err:#}"));
            }
        }
    }

    fn open_link(&mut self, tool: &Tool) {
        match launcher::open_url(&tool.url) {
            Ok(child) => {
                info!(tool = %tool.id, url = %tool.url, "opening in browser");
                self.launched.push(child);
                self.ctx.toast = Some(format!("{} tarayıcıda açılıyor...", tool.name));
            }
            Err(err) => {
                warn!(error = %err, "browser launch failed");
                self.ctx.toast = Some(format!("Bağlantı açılamadı: {err:#}"));
            }
        }
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);
        self.hit_areas = HitAreas::default();

        if self.ctx.loading {
            self.draw_loading(area, frame);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(4),
            ])
            .split(area);

        frame.render_widget(self.navbar(), layout[0]);

        match self.ctx.panel {
            Panel::Catalog => self.draw_catalog(frame, layout[1]),
            Panel::Account => self.draw_account(frame, layout[1]),
        }

        let footer = Paragraph::new(Text::from(self.footer_lines()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[2]);

        if self.ctx.detail.is_some() {
            self.draw_detail(area, frame);
        }

        if self.settings_panel.open {
            self.draw_settings_panel(area, frame);
        }

        if self.ctx.alert.is_some() {
            self.draw_alert(area, frame);
        }
    }

    fn draw_loading(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(40, 20, area);
        let lines = vec![
            Line::from(Span::styled(
                "Sistem Yükleniyor...",
                Style::default()
                    .fg(self.accent_color())
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            )),
            Line::raw(""),
            Line::from(Span::styled(
                "Burak TURGUT AI",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(Text::from(lines)).alignment(Alignment::Center);
        frame.render_widget(paragraph, popup_area);
    }

    fn navbar(&self) -> Paragraph<'static> {
        let accent = self.accent_color();
        let account_label = match &self.ctx.user {
            Some(user) if user.is_registered => user.display_name(),
            _ => "Hesabım".to_string(),
        };

        let line = Line::from(vec![
            Span::styled(" Burak TURGUT ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                "AI",
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            nav_item("Araçlar", self.ctx.panel == Panel::Catalog, accent),
            Span::raw("  "),
            nav_item(
                &format!("[ {account_label} ]"),
                self.ctx.panel == Panel::Account,
                accent,
            ),
        ]);
        Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM))
    }

    fn draw_catalog(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        frame.render_widget(self.hero(), sections[0]);
        self.draw_search_box(frame, sections[1]);
        frame.render_widget(self.filter_bar(), sections[2]);
        self.draw_results_heading(frame, sections[3]);

        if self.ctx.visible_tools().is_empty() {
            frame.render_widget(self.empty_state(), sections[4]);
        } else {
            self.draw_grid(frame, sections[4]);
        }
    }

    fn hero(&self) -> Paragraph<'static> {
        let accent = self.accent_color();
        let lines = vec![
            Line::from(Span::styled(
                HERO_BADGE,
                Style::default()
                    .fg(Color::White)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                HERO_TITLE,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(HERO_TAGLINE, Style::default().fg(Color::Gray))),
        ];
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    }

    fn draw_search_box(&self, frame: &mut ratatui::Frame, area: Rect) {
        let border_style = if self.search.editing {
            Style::default()
                .fg(self.accent_color())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Ara ")
            .title_bottom(Line::from(" / veya F ").right_aligned());
        let inner = block.inner(area);

        let content = if self.ctx.query.is_empty() {
            Line::from(Span::styled(
                SEARCH_PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::raw(self.ctx.query.clone())
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if self.search.editing {
            let width = UnicodeWidthStr::width(self.ctx.query.as_str()) as u16;
            let x = inner.x + width.min(inner.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y));
        }
    }

    fn filter_bar(&self) -> Paragraph<'static> {
        let favorites_label = format!(" ★ FAVORİLERİM ({}) ", self.ctx.favorites.len());
        let view_line = Line::from(vec![
            option_chip(" TÜM ARAÇLAR ", !self.ctx.favorites_only, false),
            Span::raw("  "),
            option_chip(&favorites_label, self.ctx.favorites_only, false),
        ]);

        let mut chips = Vec::new();
        for chip in CategoryFilter::CHIPS {
            if !chips.is_empty() {
                chips.push(Span::raw(" "));
            }
            let selected = chip == self.ctx.category;
            let label = format!(" {chip} {} ", self.ctx.catalog.count_in(chip));
            chips.push(option_chip(&label, selected, selected && !self.ctx.favorites_only));
        }

        Paragraph::new(Text::from(vec![view_line, Line::from(chips)]))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
    }

    fn draw_results_heading(&self, frame: &mut ratatui::Frame, area: Rect) {
        let count = format!("{} Sonuç", self.ctx.visible_tools().len());
        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(count.chars().count() as u16 + 1),
            ])
            .split(area);

        let heading = Paragraph::new(Line::from(Span::styled(
            results_heading(self.ctx.category, self.ctx.favorites_only),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )));
        let count = Paragraph::new(Line::from(Span::styled(
            count,
            Style::default()
                .fg(self.accent_color())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Right);
        frame.render_widget(heading, row[0]);
        frame.render_widget(count, row[1]);
    }

    fn empty_state(&self) -> Paragraph<'static> {
        let hint = if self.ctx.favorites_only {
            "Henüz favori listenize bir araç eklememişsiniz. Keşfetmeye ne dersiniz?"
        } else {
            "Arama teriminizi sadeleştirmeyi veya farklı bir kategori denemeyi tercih edebilirsiniz."
        };
        let lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                "Üzgünüz, bir şey bulamadık.",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
            Line::raw(""),
            Line::from(vec![
                Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(
                    " ANA SAYFAYA DÖN → ",
                    Style::default()
                        .fg(Color::White)
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL))
    }

    fn draw_grid(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let columns = grid_columns(area.width);
        self.columns = columns;
        self.ctx.clamp_selection();

        let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
        let selected_row = self.ctx.selected / columns;
        if selected_row < self.grid_scroll {
            self.grid_scroll = selected_row;
        } else if selected_row >= self.grid_scroll + visible_rows {
            self.grid_scroll = selected_row + 1 - visible_rows;
        }

        let accent = self.accent_color();
        let mut cards = Vec::new();
        {
            let tools = self.ctx.visible_tools();
            let row_areas = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
                .split(area);
            let column_constraints = vec![Constraint::Ratio(1, columns as u32); columns];

            for (row_offset, row_area) in row_areas.iter().enumerate() {
                let cells = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(column_constraints.clone())
                    .split(*row_area);
                for (column, cell) in cells.iter().enumerate() {
                    let idx = (self.grid_scroll + row_offset) * columns + column;
                    let Some(tool) = tools.get(idx) else {
                        break;
                    };
                    let favorite = self.ctx.favorites.contains(&tool.id);
                    let card = tool_card(tool, idx == self.ctx.selected, favorite, accent, cell.width);
                    frame.render_widget(card, *cell);
                    cards.push((*cell, idx));
                }
            }
        }
        self.hit_areas.cards = cards;
    }

    fn draw_detail(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(tool) = self.ctx.detail_tool() else {
            return;
        };
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let accent = self.accent_color();
        let favorite = self.ctx.favorites.contains(&tool.id);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                format!(" {} ", tool.name),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner_width = block.inner(popup_area).width as usize;

        let mut badges = vec![Span::styled(
            format!(" {} ", tool.category),
            Style::default()
                .fg(Color::White)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
        )];
        if tool.is_popular {
            badges.push(Span::raw(" "));
            badges.push(Span::styled(
                " ✦ Popüler ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let mut lines = vec![
            Line::from(badges),
            Line::raw(""),
            Line::from(Span::styled(
                tool.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
        ];
        for line in wrap_text(&tool.long_description, inner_width.max(8)) {
            lines.push(Line::raw(line));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("Web: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(tool.url.clone(), Style::default().fg(accent)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Görsel: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(tool.image_url.clone(), Style::default().fg(Color::Gray)),
        ]));
        lines.push(Line::raw(""));
        lines.push(key_hints(&[
            ("o", "Aracı Ziyaret Et"),
            ("c", "Paylaş"),
            (
                "f",
                if favorite {
                    "★ Favorilerden Çıkar"
                } else {
                    "☆ Favorilere Ekle"
                },
            ),
            ("Esc", "Kapat"),
        ]));

        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup_area);
        self.hit_areas.detail = Some(popup_area);
    }

    fn draw_account(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup_area = centered_rect(60, 90, area);
        match &self.ctx.user {
            Some(user) if user.is_registered => {
                let field_of_work = if user.field_of_work.trim().is_empty() {
                    "Belirtilmemiş".to_string()
                } else {
                    user.field_of_work.clone()
                };
                let lines = vec![
                    Line::raw(""),
                    Line::from(Span::styled(
                        user.display_name(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        user.email.clone(),
                        Style::default().fg(Color::Gray),
                    )),
                    Line::raw(""),
                    Line::from(Span::styled(
                        "UĞRAŞILAN ALAN",
                        Style::default()
                            .fg(Color::Gray)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::raw(field_of_work),
                    Line::raw(""),
                    Line::raw(format!("Favori araç sayısı: {}", self.ctx.favorites.len())),
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw("  "),
                        Span::styled(
                            " Çıkış Yap ",
                            Style::default()
                                .fg(Color::White)
                                .bg(Color::Red)
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]),
                ];
                let paragraph = Paragraph::new(Text::from(lines))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title(" Profil "));
                frame.render_widget(paragraph, popup_area);
            }
            _ => self.draw_auth_form(frame, popup_area),
        }
    }

    fn draw_auth_form(&self, frame: &mut ratatui::Frame, area: Rect) {
        let form = &self.ctx.account;
        let accent = self.accent_color();
        let (title, subtitle, submit_label, switch_label) = match form.mode {
            AuthMode::Login => (
                " Giriş Yap ",
                "Hesabınıza erişerek araçları takip etmeye devam edin.",
                "Giriş Yap",
                "Hesabınız yok mu? Hemen kayıt olun",
            ),
            AuthMode::SignUp => (
                " Topluluğa Katılın ",
                "AI araçlarını takip etmek ve kişisel profilinizi oluşturmak için kayıt olun.",
                "Kayıt Ol",
                "Zaten hesabınız var mı? Giriş yapın",
            ),
        };

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let inner = block.inner(area);
        let input_width = usize::from(inner.width.saturating_sub(4));

        let mut lines = vec![Line::from(Span::styled(
            subtitle,
            Style::default().fg(Color::Gray),
        ))];
        lines.push(Line::raw(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                format!("! {error}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::raw(""));
        }

        let focus = form.focus();
        let mut cursor = None;
        for field in form.fields() {
            let focused = *field == focus;
            let label_style = if focused {
                Style::default().fg(accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(Span::styled(field.label(), label_style)));

            let value = form.value(*field);
            let shown = if field.is_secret() {
                "•".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            let marker = if focused { "> " } else { "  " };
            let input = if shown.is_empty() {
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(field.placeholder(), Style::default().fg(Color::DarkGray)),
                ])
            } else {
                Line::from(vec![
                    Span::raw(marker),
                    Span::raw(tail_to_width(&shown, input_width)),
                ])
            };
            if focused {
                let shown_width = UnicodeWidthStr::width(tail_to_width(&shown, input_width).as_str());
                cursor = Some((lines.len(), 2 + shown_width));
            }
            lines.push(input);
        }

        lines.push(Line::raw(""));
        let submit_style = if form.submitting {
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::DIM)
        } else {
            Style::default()
                .fg(Color::White)
                .bg(accent)
                .add_modifier(Modifier::BOLD)
        };
        let submit_text = if form.submitting {
            format!(" {submit_label}... ")
        } else {
            format!(" {submit_label} ")
        };
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(submit_text, submit_style),
        ]));
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("F2", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(switch_label, Style::default().fg(accent)),
        ]));

        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);

        if let Some((row, col)) = cursor
            && !form.submitting
            && (row as u16) < inner.height
        {
            let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y + row as u16));
        }
    }

    fn draw_settings_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(60, 35, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Ayarlar",
            Style::default().add_modifier(Modifier::BOLD),
        ));

        frame.render_widget(block.clone(), popup_area);

        let inner = block.inner(popup_area);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(inner);

        let highlight_style = Style::default()
            .fg(Color::Black)
            .bg(self.accent_color())
            .add_modifier(Modifier::BOLD);

        let theme_row_selected = self.settings_panel.selected == SETTINGS_MENU_THEME;
        let remember_row_selected =
            self.settings_panel.selected == SETTINGS_MENU_REMEMBER_SESSION;
        let password_row_selected =
            self.settings_panel.selected == SETTINGS_MENU_PASSWORD_MIN_LEN;
        let remember = self.ctx.settings.remember_session;
        let items = vec![
            ListItem::new(Line::from(vec![
                Span::styled("Vurgu rengi: ", Style::default().add_modifier(Modifier::BOLD)),
                option_chip(
                    "mavi",
                    self.ctx.settings.theme == Theme::Light,
                    theme_row_selected,
                ),
                Span::raw(" "),
                option_chip(
                    "sarı",
                    self.ctx.settings.theme == Theme::Dark,
                    theme_row_selected,
                ),
            ])),
            ListItem::new(Line::from(vec![
                Span::styled(
                    "Oturumu hatırla: ",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                option_chip("evet", remember, remember_row_selected),
                Span::raw(" "),
                option_chip("hayır", !remember, remember_row_selected),
            ])),
            ListItem::new(Line::from(vec![
                Span::styled(
                    "En kısa şifre: ",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                option_chip(
                    &format!("{} karakter", self.ctx.settings.password_min_len),
                    true,
                    password_row_selected,
                ),
                Span::styled(
                    "  (yeniden başlatınca geçerli)",
                    Style::default().fg(Color::Gray),
                ),
            ])),
        ];

        let list = List::new(items)
            .highlight_style(highlight_style)
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always)
            .block(Block::default());

        let mut state = ListState::default();
        state.select(Some(
            self.settings_panel
                .selected
                .min(SETTINGS_MENU_ITEM_COUNT.saturating_sub(1)),
        ));
        frame.render_stateful_widget(list, sections[0], &mut state);

        let help = Paragraph::new(key_hints(&[
            ("↑/↓", "seç"),
            ("←/→", "değiştir"),
            ("Esc", "kapat"),
        ]))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left);
        frame.render_widget(help, sections[1]);
    }

    fn draw_alert(&self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(message) = &self.ctx.alert else {
            return;
        };
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                message.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
            key_hints(&[("Enter", "Tamam")]),
        ];
        let paragraph = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.accent_color()))
                    .title(" Bilgi "),
            );
        frame.render_widget(paragraph, popup_area);
    }

    fn footer_lines(&self) -> Vec<Line<'static>> {
        let hints = if self.ctx.detail.is_some() {
            key_hints(&[
                ("o", "ziyaret et"),
                ("c", "paylaş"),
                ("f", "favori"),
                ("Esc", "kapat"),
            ])
        } else {
            match self.ctx.panel {
                Panel::Catalog if self.search.editing => key_hints(&[
                    ("Enter/Esc", "bitir"),
                    ("Backspace", "sil"),
                    ("Ctrl+u", "temizle"),
                ]),
                Panel::Catalog => key_hints(&[
                    ("/", "ara"),
                    ("Tab", "kategori"),
                    ("←↑↓→", "gez"),
                    ("Enter", "detay"),
                    ("f", "favori"),
                    ("v", "görünüm"),
                    ("c", "kopyala"),
                    ("o", "aç"),
                    ("r", "sıfırla"),
                    ("a", "hesap"),
                    ("s", "ayarlar"),
                    ("Esc", "çık"),
                ]),
                Panel::Account if self.ctx.is_signed_in() => {
                    key_hints(&[("Enter", "çıkış yap"), ("Esc", "geri"), ("s", "ayarlar")])
                }
                Panel::Account => key_hints(&[
                    ("Tab", "alan"),
                    ("Enter", "gönder"),
                    ("F2", "giriş/kayıt"),
                    ("Ctrl+u", "temizle"),
                    ("Esc", "geri"),
                ]),
            }
        };

        let status = match &self.ctx.toast {
            Some(toast) => Line::from(Span::styled(
                toast.clone(),
                Style::default()
                    .fg(self.accent_color())
                    .add_modifier(Modifier::BOLD),
            )),
            None => Line::raw(""),
        };

        vec![
            status,
            hints,
            Line::from(Span::styled(
                copyright_line(chrono::Local::now().year()),
                Style::default().fg(Color::DarkGray),
            )),
        ]
    }
}

#[derive(Debug, Default)]
struct SettingsPanel {
    open: bool,
    selected: usize,
}

#[derive(Debug, Default)]
struct SearchInput {
    editing: bool,
}

/// Screen regions from the last frame, used to route mouse clicks.
#[derive(Debug, Default)]
struct HitAreas {
    detail: Option<Rect>,
    cards: Vec<(Rect, usize)>,
}

fn worker_gone() -> AuthError {
    AuthError::Backend("session worker stopped".to_string())
}

fn tool_card(
    tool: &Tool,
    selected: bool,
    favorite: bool,
    accent: Color,
    width: u16,
) -> Paragraph<'static> {
    let border_style = if selected {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    if favorite {
        block = block.title(Line::from(Span::styled(" ★ ", Style::default().fg(Color::Yellow))).right_aligned());
    }
    let inner_width = usize::from(width.saturating_sub(2));

    let mut badges = vec![Span::styled(
        format!(" {} ", tool.category),
        Style::default().fg(Color::Black).bg(Color::Gray),
    )];
    if tool.is_popular {
        badges.push(Span::raw(" "));
        badges.push(Span::styled(
            "✦ Popüler",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let name_style = if selected {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![
        Line::from(badges),
        Line::from(Span::styled(tool.name.clone(), name_style)),
    ];
    for line in clamp_lines(&tool.description, inner_width, DESCRIPTION_LINES) {
        lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Gray))));
    }

    Paragraph::new(Text::from(lines)).block(block)
}

fn nav_item(label: &str, active: bool, accent: Color) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(accent)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(label.to_string(), style)
}

fn key_hints(pairs: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (i, (key, action)) in pairs.iter().enumerate() {
        spans.push(Span::styled(
            key.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        if i + 1 == pairs.len() {
            spans.push(Span::raw(format!(" {action}")));
        } else {
            spans.push(Span::raw(format!(" {action}  ")));
        }
    }
    Line::from(spans)
}

fn results_heading(category: CategoryFilter, favorites_only: bool) -> String {
    if favorites_only {
        "Kişisel Seçkileriniz".to_string()
    } else {
        format!("{category} Kategorisindeki Araçlar")
    }
}

fn copyright_line(year: i32) -> String {
    format!("© {year} BURAK TURGUT HUB - MADE WITH AI")
}

fn grid_columns(width: u16) -> usize {
    match width {
        0..60 => 1,
        60..100 => 2,
        100..140 => 3,
        _ => 4,
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alt screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

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

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let mut chunk = String::new();
        let mut chunk_width = 0usize;
        for ch in word.chars() {
            let w = char_width(ch);
            if chunk_width + w > max_width && !chunk.is_empty() {
                lines.push(std::mem::take(&mut chunk));
                chunk_width = 0;
            }
            chunk.push(ch);
            chunk_width += w;
        }
        if !chunk.is_empty() {
            current_width = chunk_width;
            current = chunk;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// Wraps `text` and keeps at most `max_lines`, marking a cut with "…".
fn clamp_lines(text: &str, max_width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = wrap_text(text, max_width);
    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        while !last.is_empty() && UnicodeWidthStr::width(last.as_str()) + 1 > max_width {
            last.pop();
        }
        last.push('…');
    }
    lines
}

/// Keeps the end of `text` so the part being typed stays visible.
fn tail_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let mut out = Vec::new();
    let mut width = 0usize;
    for ch in text.chars().rev() {
        let w = char_width(ch);
        if width + w > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.into_iter().rev().collect()
}

fn char_width(ch: char) -> usize {
    let mut buf = [0u8; 4];
    UnicodeWidthStr::width(&*ch.encode_utf8(&mut buf))
}

fn option_chip(label: &str, selected: bool, row_selected: bool) -> Span<'static> {
    let base = if selected && row_selected {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    Span::styled(label.to_string(), base)
}
