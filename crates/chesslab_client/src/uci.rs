use chesslab_api::EvalEntry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{ChildStdin, ChildStdout, Command};

const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum LocalEngineError {
    #[error("failed to start engine {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine closed its output before {0}")]
    Closed(&'static str),

    #[error("engine did not finish within {0:?}")]
    Timeout(Duration),
}

/// Drives a UCI engine binary for client-side analysis. Each call runs a
/// fresh engine process.
#[derive(Clone, Debug)]
pub struct UciEngine {
    program: PathBuf,
    timeout: Duration,
}

impl UciEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn analyse(
        &self,
        fen: &str,
        depth: u32,
        multipv: u32,
    ) -> Result<Vec<EvalEntry>, LocalEngineError> {
        tokio::time::timeout(self.timeout, self.run(fen, depth, multipv))
            .await
            .map_err(|_| LocalEngineError::Timeout(self.timeout))?
    }

    async fn run(
        &self,
        fen: &str,
        depth: u32,
        multipv: u32,
    ) -> Result<Vec<EvalEntry>, LocalEngineError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LocalEngineError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or(LocalEngineError::Closed("uci"))?;
        let stdout = child.stdout.take().ok_or(LocalEngineError::Closed("uci"))?;
        let mut lines = BufReader::new(stdout).lines();

        send(&mut stdin, "uci").await?;
        wait_for(&mut lines, "uciok").await?;
        send(&mut stdin, &format!("setoption name MultiPV value {multipv}")).await?;
        send(&mut stdin, "isready").await?;
        wait_for(&mut lines, "readyok").await?;
        send(&mut stdin, "ucinewgame").await?;
        send(&mut stdin, &format!("position fen {fen}")).await?;
        send(&mut stdin, &format!("go depth {depth}")).await?;

        let mut ranked: BTreeMap<u32, EvalEntry> = BTreeMap::new();
        loop {
            let Some(line) = lines.next_line().await? else {
                return Err(LocalEngineError::Closed("bestmove"));
            };
            if line.starts_with("bestmove") {
                break;
            }
            if let Some(entry) = parse_info_line(&line) {
                ranked.insert(entry.multipv, entry);
            }
        }

        let _ = send(&mut stdin, "quit").await;
        let _ = child.wait().await;

        Ok(requested_ranks(ranked, multipv))
    }
}

/// Ranks are 1-based; anything outside `1..=multipv` is dropped.
fn requested_ranks(ranked: BTreeMap<u32, EvalEntry>, multipv: u32) -> Vec<EvalEntry> {
    ranked
        .into_values()
        .filter(|entry| (1..=multipv).contains(&entry.multipv))
        .collect()
}

async fn send(stdin: &mut ChildStdin, command: &str) -> Result<(), LocalEngineError> {
    stdin.write_all(command.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

async fn wait_for(
    lines: &mut Lines<BufReader<ChildStdout>>,
    token: &'static str,
) -> Result<(), LocalEngineError> {
    while let Some(line) = lines.next_line().await? {
        if line.trim() == token {
            return Ok(());
        }
    }
    Err(LocalEngineError::Closed(token))
}

/// Parses an `info ... pv ...` line into a ranked entry. Lines without a
/// principal variation carry no move and are skipped.
pub fn parse_info_line(line: &str) -> Option<EvalEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first() != Some(&"info") {
        return None;
    }
    let pv_index = tokens.iter().position(|t| *t == "pv")?;
    let pv_moves = &tokens[pv_index + 1..];

    let value_after = |name: &str| -> Option<&str> {
        let index = tokens[..pv_index].iter().position(|t| *t == name)?;
        tokens.get(index + 1).copied()
    };

    let depth = value_after("depth").and_then(|v| v.parse().ok()).unwrap_or(0);
    let multipv = value_after("multipv")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    let mut score_cp = None;
    let mut score_mate = None;
    if let Some(index) = tokens[..pv_index].iter().position(|t| *t == "score") {
        let kind = tokens.get(index + 1).copied();
        let value = tokens.get(index + 2).and_then(|v| v.parse::<i32>().ok());
        match kind {
            Some("cp") => score_cp = value,
            Some("mate") => score_mate = value,
            _ => {}
        }
    }

    Some(EvalEntry {
        depth,
        multipv,
        pv_uci: (!pv_moves.is_empty()).then(|| pv_moves.join(" ")),
        score_cp,
        score_mate,
        bestmove_uci: pv_moves.first().map(|mv| (*mv).to_owned()),
    })
}
