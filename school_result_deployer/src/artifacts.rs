use std::{
    fs,
    path::{Path, PathBuf},
};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

const BUILD_INFO_DIR: &str = "build-info";
const LIBRARY_PLACEHOLDER_PREFIX: &str = "__$";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact for contract '{name}' not found under {}", .root.display())]
    NotFound { name: String, root: PathBuf },
    #[error("Multiple artifacts for contract '{name}', use a fully qualified name: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
    #[error("Failed to read artifact {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Cannot deploy '{0}': contract is abstract or an interface")]
    AbstractContract(String),
    #[error("Cannot deploy '{0}': bytecode has unlinked library references")]
    UnlinkedLibraries(String),
    #[error("Invalid bytecode for '{name}': {reason}")]
    InvalidBytecode { name: String, reason: String },
}

/// Compiler output for a single contract, as written by hardhat to
/// `artifacts/<source>/<Contract>.json`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(rename = "_format", default)]
    pub format: Option<String>,
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: String,
    #[serde(default)]
    pub deployed_bytecode: String,
    #[serde(default)]
    pub link_references: serde_json::Value,
}

impl ContractArtifact {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// The creation (init) code to send in a deployment transaction.
    pub fn creation_bytecode(&self) -> Result<Bytes, ArtifactError> {
        if self.bytecode.contains(LIBRARY_PLACEHOLDER_PREFIX) {
            return Err(ArtifactError::UnlinkedLibraries(
                self.contract_name.clone(),
            ));
        }

        let hex_str = self.bytecode.trim_start_matches("0x");
        if hex_str.is_empty() {
            return Err(ArtifactError::AbstractContract(self.contract_name.clone()));
        }

        let code = hex::decode(hex_str).map_err(|e| ArtifactError::InvalidBytecode {
            name: self.contract_name.clone(),
            reason: e.to_string(),
        })?;
        Ok(code.into())
    }
}

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Accepts either a bare contract name or `path/to/Source.sol:Name`.
    pub fn find(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{contract}.json"));
            if !path.is_file() {
                return Err(self.not_found(name));
            }
            return Ok(path);
        }

        let file_name = format!("{name}.json");
        let mut candidates = self.collect_matches(&file_name)?;
        candidates.sort();

        match candidates.len() {
            0 => Err(self.not_found(name)),
            1 => Ok(candidates.remove(0)),
            _ => Err(ArtifactError::Ambiguous {
                name: name.to_owned(),
                candidates: candidates
                    .iter()
                    .map(|path| self.qualified_name_of(path, name))
                    .collect(),
            }),
        }
    }

    pub fn read(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let path = self.find(name)?;
        let raw = fs::read_to_string(&path).map_err(|source| ArtifactError::Read {
            path: path.clone(),
            source,
        })?;
        let artifact = ContractArtifact::from_json_str(&raw)
            .map_err(|source| ArtifactError::Parse { path: path.clone(), source })?;

        tracing::debug!(
            artifact = %artifact.fully_qualified_name(),
            path = %path.display(),
            "read contract artifact"
        );
        Ok(artifact)
    }

    fn collect_matches(&self, file_name: &str) -> Result<Vec<PathBuf>, ArtifactError> {
        // a missing artifacts dir just means nothing was compiled
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        // symlinks are not followed, so a link back up the tree cannot loop
        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == BUILD_INFO_DIR));

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ArtifactError::Read {
                path: e.path().map(Path::to_owned).unwrap_or_else(|| self.root.clone()),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && entry.file_name() == file_name {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }

    fn qualified_name_of(&self, path: &Path, name: &str) -> String {
        let source = path
            .parent()
            .and_then(|parent| parent.strip_prefix(&self.root).ok())
            .map(|source| source.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{source}:{name}")
    }

    fn not_found(&self, name: &str) -> ArtifactError {
        ArtifactError::NotFound {
            name: name.to_owned(),
            root: self.root.clone(),
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use std::{fs, path::Path};

    /// Minimal ABI of the school result contract, covering the calls this crate makes.
    pub const SCHOOL_RESULT_ABI: &str = r#"[
        {"type":"constructor","inputs":[],"stateMutability":"nonpayable"},
        {"type":"function","name":"add_department","stateMutability":"nonpayable",
         "inputs":[{"name":"_name","type":"string"},{"name":"_code","type":"string"}],"outputs":[]},
        {"type":"function","name":"add_student","stateMutability":"nonpayable",
         "inputs":[{"name":"_student","type":"address"},{"name":"_name","type":"string"},
                   {"name":"_regNo","type":"string"},{"name":"_departmentId","type":"uint256"}],"outputs":[]},
        {"type":"function","name":"_adminGetAllStudents","stateMutability":"view","inputs":[],
         "outputs":[{"name":"","type":"tuple[]","components":[
            {"name":"studentAddress","type":"address"},{"name":"name","type":"string"},
            {"name":"regNo","type":"string"},{"name":"departmentId","type":"uint256"}]}]}
    ]"#;

    pub fn artifact_json(contract_name: &str, source_name: &str, bytecode: &str) -> String {
        format!(
            r#"{{
                "_format": "hh-sol-artifact-1",
                "contractName": "{contract_name}",
                "sourceName": "{source_name}",
                "abi": {SCHOOL_RESULT_ABI},
                "bytecode": "{bytecode}",
                "deployedBytecode": "{bytecode}",
                "linkReferences": {{}},
                "deployedLinkReferences": {{}}
            }}"#
        )
    }

    pub fn write_artifact(root: &Path, contract_name: &str, source_name: &str, bytecode: &str) {
        let dir = root.join(source_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{contract_name}.json")),
            artifact_json(contract_name, source_name, bytecode),
        )
        .unwrap();
        fs::write(dir.join(format!("{contract_name}.dbg.json")), "{}").unwrap();
    }
}
