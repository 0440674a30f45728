//! Graphviz export of an automaton, optionally with the path of a run drawn on top.
//!
//! Layout is left to the external `dot` program; this module only writes the
//! graph description and pipes it through.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::automaton::{Dfa, Run};
use crate::error::{Error, Result};

const PATH_COLOR: &str = "blue";
const ACCEPT_COLOR: &str = "forestgreen";
const REJECT_COLOR: &str = "red";

/// Writes `dfa` as a Graphviz digraph.
///
/// Parallel transitions between the same two states become one edge labelled
/// with every symbol. When `run` is given, the visited states and the edges
/// taken are highlighted and the last state is coloured by the verdict.
pub fn dot(dfa: &Dfa, run: Option<&Run<'_>>) -> String {
    Dot { dfa, run }.to_string()
}

struct Dot<'d, 'a> {
    dfa: &'d Dfa,
    run: Option<&'d Run<'a>>,
}

impl fmt::Display for Dot<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dfa = self.dfa;
        let mut visited = HashSet::new();
        let mut taken = HashSet::new();
        let mut last = None;
        if let Some(run) = self.run {
            visited.extend(run.trace());
            taken.extend(run.steps().map(|step| (step.from, step.to)));
            last = Some((run.final_state(), run.is_accepted()));
        }

        writeln!(f, "digraph dfa {{")?;
        writeln!(f, "    rankdir=LR;")?;
        writeln!(f, "    node [shape=circle];")?;
        writeln!(f, "    \"\" [shape=none, width=0, height=0, label=\"\"];")?;

        for state in dfa.states() {
            let mut attrs = Vec::new();
            if dfa.is_final(state) {
                attrs.push("shape=doublecircle".to_string());
            }
            match last {
                Some((end, accepted)) if end == state => {
                    let color = if accepted { ACCEPT_COLOR } else { REJECT_COLOR };
                    attrs.push(format!("color={color}, fontcolor={color}, penwidth=2"));
                }
                _ if visited.contains(state) => {
                    attrs.push(format!("color={PATH_COLOR}, penwidth=2"))
                }
                _ => {}
            }
            if attrs.is_empty() {
                writeln!(f, "    {};", quote(state))?;
            } else {
                writeln!(f, "    {} [{}];", quote(state), attrs.join(", "))?;
            }
        }

        let start_attrs =
            if self.run.is_some() { format!(" [color={PATH_COLOR}]") } else { String::new() };
        writeln!(f, "    \"\" -> {}{};", quote(dfa.initial_state()), start_attrs)?;

        let mut edges = BTreeMap::<(&str, &str), Vec<char>>::new();
        for (from, symbol, to) in dfa.transitions() {
            edges.entry((from, to)).or_default().push(symbol);
        }
        for ((from, to), symbols) in edges {
            let label = symbols.iter().map(char::to_string).collect::<Vec<_>>().join(",");
            let highlight = if taken.contains(&(from, to)) {
                format!(", color={PATH_COLOR}, fontcolor={PATH_COLOR}, penwidth=2")
            } else {
                String::new()
            };
            writeln!(
                f,
                "    {} -> {} [label={}{}];",
                quote(from),
                quote(to),
                quote(&label),
                highlight
            )?;
        }

        writeln!(f, "}}")
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Svg,
    Png,
    Pdf,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Svg => "svg",
            Format::Png => "png",
            Format::Pdf => "pdf",
        }
    }
}

/// Where and how diagrams are rendered.
#[derive(Debug, Clone)]
pub struct Configuration {
    dot_binary: PathBuf,
    format: Format,
    output_dir: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            dot_binary: PathBuf::from("dot"),
            format: Format::Svg,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn dot_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.dot_binary = path.into();
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir_path(&self) -> &Path {
        &self.output_dir
    }

    pub fn build(self) -> Renderer {
        Renderer { config: self }
    }
}

pub struct Renderer {
    config: Configuration,
}

impl Renderer {
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Path the diagram called `name` is written to.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(format!("{}.{}", name, self.config.format.extension()))
    }

    /// Renders the automaton (and run, if any) to `<output_dir>/<name>.<ext>`.
    pub fn render(&self, dfa: &Dfa, run: Option<&Run<'_>>, name: &str) -> Result<PathBuf> {
        let bytes = self.render_bytes(&dot(dfa, run))?;
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.output_path(name);
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "rendered diagram");
        Ok(path)
    }

    /// Pipes DOT source through the renderer and returns its output.
    pub fn render_bytes(&self, source: &str) -> Result<Vec<u8>> {
        let format = format!("-T{}", self.config.format.extension());
        let mut child = Command::new(&self.config.dot_binary)
            .arg(format)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(source.as_bytes())
        {
            drop(stdin);
            reap(&mut child);
            return Err(e.into());
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::RendererFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Stops a renderer that will not get its whole input and waits for it.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("could not kill the renderer: {}", e);
    }
    match child.wait() {
        Ok(status) => debug!(%status, "renderer stopped before reading its input"),
        Err(e) => warn!("could not wait for the renderer: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDS_IN_A: &str = r#"{
        "states": ["0", "1"],
        "input_symbols": ["a", "b"],
        "transitions": { "0": { "a": "1", "b": "0" }, "1": { "a": "1", "b": "0" } },
        "initial_state": "0",
        "final_states": ["1"]
    }"#;

    #[test]
    fn test_plain_graph() {
        let dfa = Dfa::from_json(ENDS_IN_A).unwrap();
        let source = dot(&dfa, None);

        assert!(source.starts_with("digraph dfa {"));
        assert!(source.contains("\"1\" [shape=doublecircle];"));
        assert!(source.contains("\"\" -> \"0\";"));
        assert!(source.contains("\"0\" -> \"1\" [label=\"a\"];"));
        assert!(source.contains("\"0\" -> \"0\" [label=\"b\"];"));
        assert!(!source.contains(PATH_COLOR));
    }

    #[test]
    fn test_merged_labels() {
        let json = r#"{
            "states": ["p"],
            "input_symbols": ["0", "1"],
            "transitions": { "p": { "0": "p", "1": "p" } },
            "initial_state": "p",
            "final_states": []
        }"#;
        let dfa = Dfa::from_json(json).unwrap();
        assert!(dot(&dfa, None).contains("\"p\" -> \"p\" [label=\"0,1\"];"));
    }

    #[test]
    fn test_highlighted_run() {
        let dfa = Dfa::from_json(ENDS_IN_A).unwrap();

        let run = dfa.evaluate("ba").unwrap();
        let source = dot(&dfa, Some(&run));
        assert!(source.contains("\"0\" -> \"0\" [label=\"b\", color=blue"));
        assert!(source.contains("\"0\" -> \"1\" [label=\"a\", color=blue"));
        assert!(source.contains("\"1\" -> \"0\" [label=\"b\"];"));
        assert!(source.contains("\"1\" [shape=doublecircle, color=forestgreen"));

        let run = dfa.evaluate("ab").unwrap();
        let source = dot(&dfa, Some(&run));
        assert!(source.contains("\"0\" [color=red"));
        assert!(source.contains("\"1\" [shape=doublecircle, color=blue"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_configuration() {
        let renderer = Configuration::new().format(Format::Png).output_dir("out").build();
        assert_eq!(renderer.output_path("automaton"), PathBuf::from("out/automaton.png"));
        assert_eq!(renderer.config().output_dir_path(), Path::new("out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_renderer_ignoring_input() {
        // `true` exits without reading, so writing more than a pipe buffer fails
        let renderer = Configuration::new().dot_binary("true").build();
        let source = "x".repeat(4 << 20);
        match renderer.render_bytes(&source) {
            Err(Error::Render(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected a broken pipe, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_renderer() {
        let renderer = Configuration::new().dot_binary("false").build();
        assert!(matches!(renderer.render_bytes(""), Err(Error::RendererFailed { .. })));
    }

    #[test]
    fn test_missing_renderer() {
        let dfa = Dfa::from_json(ENDS_IN_A).unwrap();
        let renderer = Configuration::new().dot_binary("/nonexistent/graphviz/dot").build();
        assert!(matches!(renderer.render(&dfa, None, "automaton"), Err(Error::Render(_))));
    }
}
