#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod export;
pub mod font;
pub mod geom;
pub mod pipeline;
pub mod text;

use std::fmt;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

use config::IllusionConfig;
use export::GlbOptions;
use font::{BlockFont, FontChoice, GlyphSource, TtfFont};
use pipeline::{IllusionError, PipelineReport, export_mesh, generate_illusion};

pub use pipeline::{ExportFormat, IllusionRequest, IllusionSolid};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "wasm-parallel", target_arch = "wasm32"))]
#[wasm_bindgen(js_name = initializeParallel)]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err:?}")))
}

/// Public entry point for browser consumers. Holds a font, never a mesh.
#[wasm_bindgen]
pub struct Generator {
    font: Box<dyn GlyphSource>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Generator {
    /// Generator backed by the built-in block font.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Generator {
        Generator {
            font: Box::new(BlockFont::new()),
        }
    }

    /// Generator backed by a TrueType / OpenType font file's bytes.
    #[wasm_bindgen(js_name = withFont)]
    pub fn with_font(bytes: Vec<u8>) -> Result<Generator, JsValue> {
        let font = TtfFont::from_bytes("custom", bytes).map_err(to_js_error)?;
        Ok(Generator { font: Box::new(font) })
    }

    #[wasm_bindgen(js_name = fontName)]
    #[must_use]
    pub fn font_name(&self) -> String {
        self.font.name().to_string()
    }

    /// Check a word pair without building geometry.
    #[wasm_bindgen(js_name = validateWords)]
    pub fn validate_words(&self, word_a: &str, word_b: &str) -> Result<(), JsValue> {
        text::validate_word_pair(word_a, word_b)
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Build and encode the solid described by `options` (an
    /// `IllusionConfig`-shaped object). Returns the file bytes.
    pub fn generate(&self, options: JsValue) -> Result<Vec<u8>, JsValue> {
        let config: IllusionConfig = serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        let (bytes, _) = self.render(&config).map_err(to_js_error)?;
        Ok(bytes)
    }

    /// Like [`Generator::generate`] but returns the per-stage report only.
    #[wasm_bindgen(js_name = generateReport)]
    pub fn generate_report(&self, options: JsValue) -> Result<JsValue, JsValue> {
        let config: IllusionConfig = serde_wasm_bindgen::from_value(options).map_err(to_js_error)?;
        let request = config.to_request().map_err(to_js_error)?;
        let solid = generate_illusion(&request, self.font.as_ref()).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&solid.report).map_err(to_js_error)
    }
}

impl Generator {
    /// Validate, generate and encode `config` with this generator's font.
    ///
    /// A font path in `config` is ignored: the generator's font was fixed at
    /// construction.
    pub fn render(&self, config: &IllusionConfig) -> Result<(Vec<u8>, PipelineReport), IllusionError> {
        if let FontChoice::File(path) = &config.font {
            log::debug!(
                "ignoring font path {} in favour of '{}'",
                path.display(),
                self.font.name()
            );
        }
        let request = config.to_request()?;
        let solid = generate_illusion(&request, self.font.as_ref())?;
        let glb = GlbOptions {
            unlit: config.unlit,
            ..GlbOptions::default()
        };
        let name = format!("{}_{}", solid.report.word_a, solid.report.word_b);
        let bytes = export_mesh(&solid.mesh, config.format, &name, &glb)?;
        Ok((bytes, solid.report))
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
