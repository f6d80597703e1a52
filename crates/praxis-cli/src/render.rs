//! Terminal rendering of live sessions
//!
//! Typed text is printed as suffixes: each reveal update only writes the
//! characters beyond what is already on screen for the focused field, so a
//! cumulative chunk never re-prints its prefix. When a chunk for another
//! field arrives, the field being typed is finished from its latest chunk
//! before the new line starts.

use colored::Colorize;
use std::collections::HashMap;
use std::io::{self, Write};

use praxis::{AnalysisBoard, Board, ChallengeBoard, RevealKey, RevealView, SessionStatus, StreamEvent};

pub struct StreamPrinter<W: Write> {
    out: W,
    focus: Option<RevealKey>,
    /// Characters already on screen, per field
    printed: HashMap<RevealKey, usize>,
    /// Latest full value per field
    targets: HashMap<RevealKey, String>,
    last_message: String,
    mid_line: bool,
    resume_header: bool,
}

impl StreamPrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            focus: None,
            printed: HashMap::new(),
            targets: HashMap::new(),
            last_message: String::new(),
            mid_line: false,
            resume_header: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// React to one event. `typewriter` tells whether text arrives through
    /// reveal updates or should be printed straight from the chunk.
    pub fn event(&mut self, event: &StreamEvent, board: &Board, typewriter: bool) -> io::Result<()> {
        match event {
            StreamEvent::Start { message } => self.status_line(0, message)?,
            StreamEvent::Progress(progress) => self.status_line(progress.percent, &progress.message)?,
            StreamEvent::FieldChunk(chunk) => {
                if let (Some(key), Some(text)) = (board.reveal_key(chunk), chunk.content.as_str()) {
                    self.targets.insert(key.clone(), text.to_string());
                    self.focus_on(&key)?;
                    if !typewriter {
                        self.text(&key, text)?;
                    }
                }
            }
            StreamEvent::ItemComplete(item) => {
                self.finish_focus()?;
                self.end_line()?;
                let title = item
                    .data
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or("(sem título)");
                let counter = match item.total {
                    Some(total) => format!("[{}/{}]", item.number, total),
                    None => format!("[{}]", item.number),
                };
                writeln!(self.out, "{} {} {}", "✓".green(), counter.dimmed(), title.bold())?;
                self.focus = None;
            }
            StreamEvent::Complete(_) => {
                self.finish_focus()?;
                self.end_line()?;
                self.focus = None;
            }
            StreamEvent::Error { .. } => {
                self.end_line()?;
                self.focus = None;
            }
        }
        self.out.flush()
    }

    /// Catch up with the focused field after a reveal update
    pub fn reveal(&mut self, view: &RevealView) -> io::Result<()> {
        let Some(key) = self.focus.clone() else {
            return Ok(());
        };
        if let Some(text) = view.text(&key) {
            self.text(&key, text)?;
        }
        self.out.flush()
    }

    fn text(&mut self, key: &RevealKey, visible: &str) -> io::Result<()> {
        if self.focus.as_ref() != Some(key) {
            return Ok(());
        }
        let done = self.printed.get(key).copied().unwrap_or_default();
        let suffix: String = visible.chars().skip(done).collect();
        if suffix.is_empty() {
            return Ok(());
        }
        if self.resume_header {
            write!(self.out, "{} ", format!("{}:", key).cyan())?;
            self.resume_header = false;
        }
        self.printed.insert(key.clone(), done + suffix.chars().count());
        self.mid_line = !suffix.ends_with('\n');
        write!(self.out, "{}", suffix)
    }

    fn focus_on(&mut self, key: &RevealKey) -> io::Result<()> {
        if self.focus.as_ref() == Some(key) {
            return Ok(());
        }
        self.finish_focus()?;
        self.end_line()?;
        write!(self.out, "{} ", format!("{}:", key).cyan())?;
        self.focus = Some(key.clone());
        self.mid_line = true;
        self.resume_header = false;
        Ok(())
    }

    /// Print the rest of the focused field without waiting for its reveal
    fn finish_focus(&mut self) -> io::Result<()> {
        let Some(key) = self.focus.clone() else {
            return Ok(());
        };
        match self.targets.get(&key).cloned() {
            Some(target) => self.text(&key, &target),
            None => Ok(()),
        }
    }

    fn status_line(&mut self, percent: u8, message: &str) -> io::Result<()> {
        if message.is_empty() || message == self.last_message {
            return Ok(());
        }
        self.end_line()?;
        writeln!(self.out, "{} {}", format!("[{:>3}%]", percent).dimmed(), message)?;
        self.last_message = message.to_string();
        // the focused field continues under a fresh header
        self.resume_header = self.focus.is_some();
        Ok(())
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }
}

/// Final summary once a session is over
pub fn print_summary(board: &Board) {
    match board.status() {
        SessionStatus::Failed(message) => {
            println!("{} {}", "✗".red(), message);
            return;
        }
        SessionStatus::Cancelled => {
            println!("{}", "Cancelled.".yellow());
            return;
        }
        SessionStatus::Running => {
            println!("{}", "Stream ended unexpectedly.".yellow());
            return;
        }
        SessionStatus::Completed => {}
    }

    match board {
        Board::Challenges(board) => print_challenges(board),
        Board::Analysis(board) => print_analysis(board),
    }
}

fn print_challenges(board: &ChallengeBoard) {
    println!();
    println!("{}", "Challenges:".bold());
    for challenge in board.catalog() {
        print_challenge_line(challenge);
    }
}

pub fn print_challenge_line(challenge: &praxis::Challenge) {
    let id = challenge
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {} {} {} {}",
        id.dimmed(),
        challenge.display_title().cyan().bold(),
        format!("[{}]", challenge.category.as_deref().unwrap_or("?")).dimmed(),
        format!("{} · {} min", challenge.difficulty.level, challenge.difficulty.time_limit).dimmed()
    );
}

pub fn print_challenge(challenge: &praxis::Challenge) {
    print_challenge_line(challenge);
    let description = &challenge.description;
    if !description.text.is_empty() {
        println!("\n{}", description.text);
    }
    if let Some(language) = &description.language {
        println!("\n{} {}", "Language:".bold(), language);
    }
    print_list("Evaluation criteria", &description.eval_criteria);
    print_list("Hints", &description.hints);
    if let Some(fs) = &challenge.fs {
        print_list("Files", &fs.files);
    }
}

pub fn print_report(analysis: &praxis::ResumeAnalysis) {
    let score = analysis.nota_geral.to_string();
    let score = if analysis.nota_geral >= 70 {
        score.green()
    } else if analysis.nota_geral >= 40 {
        score.yellow()
    } else {
        score.red()
    };

    println!("\n{} {}/100", "Score:".bold(), score);
    if !analysis.resumo_executivo.is_empty() {
        println!("\n{}", analysis.resumo_executivo);
    }
    print_list("Strengths", &analysis.pontos_fortes);
    print_list("Technical gaps", &analysis.gaps_tecnicos);
    print_list("Suggestions", &analysis.sugestoes_melhoria);

    let skills = analysis.top_skills(5);
    if !skills.is_empty() {
        println!("\n{}", "Top skills:".bold());
        for (name, value) in skills {
            println!("  {:<24} {:>5.1}", name, value);
        }
    }
}

fn print_analysis(board: &AnalysisBoard) {
    match board.analysis() {
        Some(analysis) => print_report(analysis),
        None => println!("{}", "Analysis finished without a readable report.".yellow()),
    }
    if let Some(id) = board.resume_id() {
        println!("\n{} resume #{}", "Saved:".dimmed(), id);
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}", format!("{}:", title).bold());
    for item in items {
        println!("  • {}", item);
    }
}
