//! Support modules: the fixed domains and transforms the compiler installs
//! next to user programs.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use pcc_core::{ProgramName, ProgramNameError};
use thiserror::Error;

use crate::{ModuleRef, Program};

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("could not read support module '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid support module location")]
    InvalidPath(#[from] ProgramNameError),
}

/// A support module shipped with the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportModule {
    /// Domain of serialized source programs.
    SourceDomain,
    /// Transform combining per-machine units into one executable.
    LinkTransform,
    /// Domain of generated C programs.
    TargetDomain,
    /// Domain of generated verification models.
    VerificationDomain,
    /// Transform annotating a program with inferred types.
    InferredTypesTransform,
    /// Transform lowering a program to C and a link descriptor.
    TargetTransform,
    /// Transform lowering a typed program to a verification model.
    VerificationTransform,
}

impl SupportModule {
    pub const ALL: [SupportModule; 7] = [
        SupportModule::SourceDomain,
        SupportModule::LinkTransform,
        SupportModule::TargetDomain,
        SupportModule::VerificationDomain,
        SupportModule::InferredTypesTransform,
        SupportModule::TargetTransform,
        SupportModule::VerificationTransform,
    ];

    /// The module name declared inside the support program.
    pub fn module_name(self) -> &'static str {
        match self {
            SupportModule::SourceDomain => "P",
            SupportModule::LinkTransform => "PLink2C",
            SupportModule::TargetDomain => "C",
            SupportModule::VerificationDomain => "Zing",
            SupportModule::InferredTypesTransform => "P2PWithInferredTypes",
            SupportModule::TargetTransform => "P2CProgram",
            SupportModule::VerificationTransform => "P2Zing",
        }
    }

    /// The file holding the support program, relative to the support
    /// directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SupportModule::SourceDomain => "P.4ml",
            SupportModule::LinkTransform => "PLink.4ml",
            SupportModule::TargetDomain => "C.4ml",
            SupportModule::VerificationDomain => "Zing.4ml",
            SupportModule::InferredTypesTransform => "PWithInferredTypes.4ml",
            SupportModule::TargetTransform => "P2CProgram.4ml",
            SupportModule::VerificationTransform => "P2Zing.4ml",
        }
    }

    /// Module names user modules must not take.
    pub fn reserved_names() -> [&'static str; 7] {
        Self::ALL.map(SupportModule::module_name)
    }

    pub fn location(self, support_dir: &Path) -> PathBuf {
        support_dir.join(self.file_name())
    }

    /// A reference to this module at its location under `support_dir`.
    pub fn module_ref(self, support_dir: &Path) -> ModuleRef {
        ModuleRef::new(self.module_name()).at(self.location(support_dir).display().to_string())
    }
}

/// Parsed support programs shared by every compiler in the process.
///
/// Entries are keyed by file location and never change once loaded. The
/// lock only guards population.
#[derive(Debug, Default)]
pub struct SupportCache {
    programs: Mutex<HashMap<PathBuf, Arc<Program>>>,
}

impl SupportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<SupportCache> {
        static CACHE: OnceLock<Arc<SupportCache>> = OnceLock::new();
        Arc::clone(CACHE.get_or_init(|| Arc::new(SupportCache::new())))
    }

    /// Load a support program, reading it from `support_dir` on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(
        &self,
        module: SupportModule,
        support_dir: &Path,
    ) -> Result<Arc<Program>, SupportError> {
        let path = module.location(support_dir);
        let mut programs = self.programs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(program) = programs.get(&path) {
            return Ok(Arc::clone(program));
        }

        tracing::debug!(module = module.module_name(), path = %path.display(), "loading support module");
        let source = std::fs::read_to_string(&path).map_err(|source| SupportError::Read {
            path: path.clone(),
            source,
        })?;
        let program = Arc::new(Program::from_source(ProgramName::new(&path)?, source));
        programs.insert(path, Arc::clone(&program));
        Ok(program)
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
