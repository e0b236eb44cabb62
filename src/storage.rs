use crate::ledger::Ledger;
use anyhow::Context;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge le ledger ; un support absent donne un ledger vide.
    fn load(&self) -> anyhow::Result<Ledger>;
    /// Sauvegarde de manière atomique.
    fn save(&self, ledger: &Ledger) -> anyhow::Result<()>;
}

/// Ledger sérialisé dans un seul fichier JSON.
pub struct JsonStorage {
    path: PathBuf,
    dir: PathBuf,
}

impl JsonStorage {
    /// Prépare le fichier `path` ; son répertoire est créé au besoin.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self { path, dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ledger vide tant que rien n'a été sauvegardé.
    pub fn load_or_default(&self) -> anyhow::Result<Ledger> {
        Ok(self.read()?.unwrap_or_default())
    }

    fn read(&self) -> anyhow::Result<Option<Ledger>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let ledger = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing ledger {}", self.path.display()))?;
        Ok(Some(ledger))
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Ledger> {
        self.load_or_default()
    }

    fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("creating temp file in {}", self.dir.display()))?;
        let mut out = BufWriter::new(tmp);
        serde_json::to_writer_pretty(&mut out, ledger)?;
        out.flush()?;
        let tmp = out.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
