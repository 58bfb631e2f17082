//! Discovery and parsing of the files reachable from a root file.
//!
//! Files are parsed breadth-first. Each include is resolved against the
//! directory of the file that names it, and a file is parsed at most once no
//! matter how many times (or in what letter case) it is included, so
//! include cycles terminate.

use std::collections::{HashSet, VecDeque};

use pcc_core::{Flag, ProgramName, codes};
use pcc_ir::{AggregateProgram, TopDeclNames};
use thiserror::Error;

/// What a parser reports for one file.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub succeeded: bool,
    pub flags: Vec<Flag>,
    /// Include paths as written in the file.
    pub includes: Vec<String>,
}

impl ParseOutput {
    pub fn success(includes: Vec<String>) -> Self {
        Self {
            succeeded: true,
            flags: Vec::new(),
            includes,
        }
    }

    pub fn failure(flags: Vec<Flag>) -> Self {
        Self {
            succeeded: false,
            flags,
            includes: Vec::new(),
        }
    }
}

/// Parser for source files.
///
/// A parser appends the declarations of one file to the shared program and
/// records its top-level names in `names`, reporting duplicates as flags.
pub trait SourceParser {
    fn parse_file(
        &mut self,
        file: &ProgramName,
        text: &str,
        names: &mut TopDeclNames,
        program: &mut AggregateProgram,
    ) -> ParseOutput;
}

/// The program assembled from a root file and everything it includes.
#[derive(Debug, Default)]
pub struct Resolution {
    pub program: AggregateProgram,
    /// Files in the order they were parsed, root first.
    pub files: Vec<ProgramName>,
    /// Messages reported by the parser for files that parsed successfully.
    pub flags: Vec<Flag>,
}

/// Resolution stopped at a file that could not be read or parsed.
#[derive(Debug, Error)]
#[error("could not resolve the program rooted at '{root}'")]
pub struct ResolveFailure {
    pub root: ProgramName,
    pub flags: Vec<Flag>,
}

/// A flag for a path that cannot be used.
pub fn bad_file(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Flag {
    Flag::error(format!("{} : {}", path, reason), codes::BAD_FILE)
}

/// Parse `root` and every file it transitively includes into one program.
pub fn resolve(
    root: &ProgramName,
    parser: &mut dyn SourceParser,
) -> Result<Resolution, ResolveFailure> {
    let mut names = TopDeclNames::new();
    let mut resolution = Resolution::default();
    let mut seen = HashSet::from([root.clone()]);
    let mut queue = VecDeque::from([root.clone()]);

    let fail = |flags: Vec<Flag>| ResolveFailure {
        root: root.clone(),
        flags,
    };

    while let Some(file) = queue.pop_front() {
        tracing::debug!(file = %file, "loading");
        let text = match std::fs::read_to_string(file.path()) {
            Ok(text) => text,
            Err(e) => {
                let mut flags = std::mem::take(&mut resolution.flags);
                flags.push(bad_file(&file, e));
                return Err(fail(flags));
            }
        };

        let output = parser.parse_file(&file, &text, &mut names, &mut resolution.program);
        resolution.flags.extend(output.flags);
        if !output.succeeded {
            return Err(fail(resolution.flags));
        }

        for include in output.includes {
            let included = match ProgramName::resolve(file.directory(), &include) {
                Ok(name) => name,
                Err(e) => {
                    let mut flags = std::mem::take(&mut resolution.flags);
                    flags.push(bad_file(&include, e));
                    return Err(fail(flags));
                }
            };
            if seen.insert(included.clone()) {
                queue.push_back(included);
            }
        }
        resolution.files.push(file);
    }

    Ok(resolution)
}
