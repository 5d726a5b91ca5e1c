use crate::assemble::assemble;
use crate::duckdb_impl::bind_info_ffi::get_named_parameter_varchar;
use crate::log;
use crate::perspective::Viewer;
use crate::registry::{Column, FieldRegistry, Scope};
use crate::types::parse_archive_document;
use chrono::Local;
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use std::borrow::Cow;
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::vec;
use zstd::stream::read::Decoder as ZstdDecoder;

#[repr(C)]
pub struct ReadChesscomBindData {
    paths: Vec<PathBuf>,
    viewer: Viewer,
    columns: Vec<Column>,
    compression: CompressionMode,
}

#[repr(C)]
pub struct ReadChesscomInitData {
    state: Mutex<SharedState>,
}

pub struct ReadChesscomVTab;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const VIEWER_PARAM_INDEX: u64 = 1;
const ROWS_PER_CHUNK: usize = 2048;

type ArchiveInput = Box<dyn Read>;

/// Rows of one archive file that have not been written yet.
struct ArchiveRows {
    rows: vec::IntoIter<Vec<String>>,
}

struct SharedState {
    next_path_idx: usize,
    available_rows: Vec<ArchiveRows>,
}

impl CompressionMode {
    fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }
}

fn resolve_compression_mode(
    bind: &BindInfo,
) -> Result<CompressionMode, Box<dyn std::error::Error>> {
    match get_named_parameter_varchar(bind, "compression")?.into_option() {
        None => Ok(CompressionMode::Plain),
        Some(raw) => CompressionMode::parse(&raw),
    }
}

fn resolve_scope(
    bind: &BindInfo,
    registry: &FieldRegistry,
) -> Result<Scope, Box<dyn std::error::Error>> {
    scope_or_default(
        get_named_parameter_varchar(bind, "scope")?.into_option().as_deref(),
        registry,
    )
}

fn scope_or_default(
    raw: Option<&str>,
    registry: &FieldRegistry,
) -> Result<Scope, Box<dyn std::error::Error>> {
    match raw {
        None => Ok(registry.default_scope()),
        Some(raw) => Scope::parse(raw),
    }
}

fn resolve_registry(bind: &BindInfo) -> Result<FieldRegistry, Box<dyn std::error::Error>> {
    let registry = match get_named_parameter_varchar(bind, "fields")?.into_option() {
        None => FieldRegistry::bundled()?,
        Some(path) => FieldRegistry::load(Path::new(&path))?,
    };
    Ok(registry)
}

fn select_columns(
    registry: &FieldRegistry,
    scope: Scope,
) -> Result<Vec<Column>, Box<dyn std::error::Error>> {
    let columns = registry.columns(scope);
    if columns.is_empty() {
        return Err(format!("Field registry has no '{}' fields", scope.as_str()).into());
    }

    for name in registry.unknown_names() {
        if columns.iter().any(|c| c.name == name) {
            log::warn(format!(
                "Unknown field '{}' in registry; the column will always be empty",
                name
            ));
        }
    }

    Ok(columns)
}

/// Result column names. A repeated registry name gets a `_1`, `_2`, ... suffix.
fn result_column_names(columns: &[Column]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let mut name = column.name.clone();
        let mut suffix = 0;
        while names.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", column.name, suffix);
        }
        names.push(name);
    }
    names
}

fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if pattern.contains('*') || pattern.contains('?') {
        Ok(glob::glob(pattern)?
            .filter_map(|entry| entry.ok())
            .collect())
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<ArchiveInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as ArchiveInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

/// Reads and derives one archive file.
fn load_archive_rows(
    path: &Path,
    bind_data: &ReadChesscomBindData,
) -> Result<ArchiveRows, String> {
    let mut input = open_input_stream(path, bind_data.compression)?;
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;

    let games =
        parse_archive_document(&text).map_err(|e| format!("{} ('{}')", e, path.display()))?;
    let game_count = games.len();
    let table = assemble(games, &bind_data.viewer, &bind_data.columns, &Local);

    log::info(format!("{}: {} games", path.display(), game_count));
    Ok(ArchiveRows {
        rows: table.rows.into_iter(),
    })
}

pub(crate) fn sanitize_for_cstring_silent(value: &str) -> Cow<'_, str> {
    if value.contains('\0') {
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle) -> Self {
        Self {
            output,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row(&mut self, row: &[String]) -> Result<(), Box<dyn std::error::Error>> {
        let row_idx = self.row_count;
        for (column_idx, value) in row.iter().enumerate() {
            let mut vector = self.output.flat_vector(column_idx);
            let sanitized = sanitize_for_cstring_silent(value);
            vector.insert(row_idx, CString::new(sanitized.as_ref())?);
        }

        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }
}

fn lock_state(
    init_data: &ReadChesscomInitData,
) -> Result<MutexGuard<'_, SharedState>, Box<dyn std::error::Error>> {
    init_data
        .state
        .lock()
        .map_err(|_| "read_chesscom scan state is poisoned".into())
}

fn acquire_rows(
    init_data: &ReadChesscomInitData,
    bind_data: &ReadChesscomBindData,
) -> Result<Option<ArchiveRows>, Box<dyn std::error::Error>> {
    loop {
        let path_idx = {
            let mut state = lock_state(init_data)?;

            if let Some(rows) = state.available_rows.pop() {
                return Ok(Some(rows));
            }

            if state.next_path_idx < bind_data.paths.len() {
                let path_idx = state.next_path_idx;
                state.next_path_idx += 1;
                path_idx
            } else {
                return Ok(None);
            }
        };

        let path = &bind_data.paths[path_idx];
        match load_archive_rows(path, bind_data) {
            Ok(rows) => return Ok(Some(rows)),
            Err(err_msg) => {
                if bind_data.paths.len() == 1 {
                    log::error(&err_msg);
                    return Err(err_msg.into());
                }

                log::warn(format!("Skipping archive: {}", err_msg));
            }
        }
    }
}

fn finalize_chunk(
    init_data: &ReadChesscomInitData,
    current_rows: Option<ArchiveRows>,
    chunk_writer: &mut ChunkWriter<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(rows) = current_rows {
        lock_state(init_data)?.available_rows.push(rows);
    }

    chunk_writer.set_output_len();
    Ok(())
}

impl VTab for ReadChesscomVTab {
    type InitData = ReadChesscomInitData;
    type BindData = ReadChesscomBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn std::error::Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let viewer = Viewer::new(bind.get_parameter(VIEWER_PARAM_INDEX).to_string());
        if viewer.username().is_empty() {
            return Err("read_chesscom requires a non-empty viewer username".into());
        }

        let compression = resolve_compression_mode(bind)?;
        let registry = resolve_registry(bind)?;
        let scope = resolve_scope(bind, &registry)?;
        let columns = select_columns(&registry, scope)?;
        let paths = expand_paths(&pattern)?;

        for name in result_column_names(&columns) {
            bind.add_result_column(&name, LogicalTypeHandle::from(LogicalTypeId::Varchar));
        }

        Ok(ReadChesscomBindData {
            paths,
            viewer,
            columns,
            compression,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn std::error::Error>> {
        Ok(ReadChesscomInitData {
            state: Mutex::new(SharedState {
                next_path_idx: 0,
                available_rows: Vec::new(),
            }),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut chunk_writer = ChunkWriter::new(output);
        let mut current_rows: Option<ArchiveRows> = None;

        while !chunk_writer.is_full() {
            if current_rows.is_none() {
                current_rows = acquire_rows(init_data, bind_data)?;
                if current_rows.is_none() {
                    break;
                }
            }

            if let Some(mut rows) = current_rows.take() {
                if let Some(row) = rows.rows.next() {
                    chunk_writer.write_row(&row)?;
                    current_rows = Some(rows);
                }
            }
        }

        finalize_chunk(init_data, current_rows, &mut chunk_writer)
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path pattern (required)
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // viewer username (required)
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            (
                "scope".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "fields".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "compression".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
        ])
    }
}
