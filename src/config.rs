use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::codec::ImageEncoding;
use crate::env::{self, EnvSource, ProcessEnv};

/// Directory holding this module's source, fixed at compile time.
pub const CONFIG_SOURCE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src");
pub const DEFAULT_MODEL_FILENAME: &str = "space_station_model.pt";

pub const CONFIG_FILE_VAR: &str = "STATION_VISION_CONFIG";
pub const PORT_VAR: &str = "PORT";
pub const MODEL_PATH_VAR: &str = "MODEL_PATH";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CORS_ORIGINS: &str = "*";
const DEFAULT_MAX_HTTP_BUFFER_SIZE: u64 = 100_000_000;
const DEFAULT_BBOX_COLOR: [u8; 3] = [0, 255, 0];
const DEFAULT_BBOX_THICKNESS: u32 = 2;
const DEFAULT_FONT_SCALE: f32 = 0.5;
const DEFAULT_FONT_THICKNESS: u32 = 1;
const DEFAULT_IMAGE_QUALITY: u8 = 90;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    server: Option<ServerConfigFile>,
    realtime: Option<RealtimeConfigFile>,
    model: Option<ModelConfigFile>,
    drawing: Option<DrawConfigFile>,
    image: Option<ImageConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ServerConfigFile {
    host: Option<String>,
    port: Option<u16>,
    cors_allowed_origins: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RealtimeConfigFile {
    async_mode: Option<String>,
    max_http_buffer_size: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DrawConfigFile {
    bbox_color: Option<[u8; 3]>,
    bbox_thickness: Option<u32>,
    font_scale: Option<f32>,
    font_thickness: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ImageConfigFile {
    encoding: Option<String>,
    quality: Option<u8>,
}

/// Settings for the detection-serving application.
///
/// Built once at startup by [`AppConfig::load`] and handed out by reference.
/// Fields are private so the resolved values cannot drift after startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    server: ServerSettings,
    realtime: RealtimeSettings,
    model: ModelSettings,
    drawing: DrawSettings,
    image: ImageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: AllowedOrigins,
}

/// Realtime (push) transport used by the serving layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeSettings {
    pub async_mode: AsyncMode,
    /// Upper bound on a single realtime message payload, in bytes.
    pub max_http_buffer_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSettings {
    /// Location of the serialized detection model. Not checked for existence.
    pub path: PathBuf,
}

/// Bounding-box drawing style for detection overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawSettings {
    pub bbox_color: [u8; 3],
    pub bbox_thickness: u32,
    pub font_scale: f32,
    pub font_thickness: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSettings {
    pub encoding: ImageEncoding,
    /// Compression quality, 0-100.
    pub quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            encoding: ImageEncoding::Jpeg,
            quality: DEFAULT_IMAGE_QUALITY,
        }
    }
}

/// Cross-origin policy for the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.iter().any(|o| o == origin),
        }
    }
}

impl FromStr for AllowedOrigins {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "*" {
            return Ok(AllowedOrigins::Any);
        }
        let origins = split_csv(s);
        if origins.is_empty() {
            return Err(anyhow!("cors_allowed_origins must be \"*\" or a list of origins"));
        }
        if origins.iter().any(|o| o == "*") {
            return Err(anyhow!("cors_allowed_origins cannot mix \"*\" with explicit origins"));
        }
        Ok(AllowedOrigins::List(origins))
    }
}

impl fmt::Display for AllowedOrigins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedOrigins::Any => f.write_str("*"),
            AllowedOrigins::List(origins) => f.write_str(&origins.join(",")),
        }
    }
}

impl Serialize for AllowedOrigins {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Eventing backend for the realtime layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncMode {
    Eventlet,
    Gevent,
    Threading,
    Asgi,
}

impl AsyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AsyncMode::Eventlet => "eventlet",
            AsyncMode::Gevent => "gevent",
            AsyncMode::Threading => "threading",
            AsyncMode::Asgi => "asgi",
        }
    }
}

impl FromStr for AsyncMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eventlet" => Ok(AsyncMode::Eventlet),
            "gevent" => Ok(AsyncMode::Gevent),
            "threading" => Ok(AsyncMode::Threading),
            "asgi" => Ok(AsyncMode::Asgi),
            other => Err(anyhow!(
                "unsupported async_mode '{}'; expected eventlet, gevent, threading or asgi",
                other
            )),
        }
    }
}

impl fmt::Display for AsyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default model location, anchored to [`CONFIG_SOURCE_DIR`].
pub fn default_model_path() -> PathBuf {
    Path::new(CONFIG_SOURCE_DIR).join(DEFAULT_MODEL_FILENAME)
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::resolve(&ProcessEnv)
    }

    /// Resolves configuration from `env`: defaults, then the optional config
    /// file named by `STATION_VISION_CONFIG`, then `PORT` / `MODEL_PATH`.
    pub fn resolve<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let file_cfg = match env::non_empty(env, CONFIG_FILE_VAR) {
            Some(path) => {
                log::debug!("reading config file {}", path);
                Some(read_config_file(Path::new(&path))?)
            }
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Result<Self> {
        let server = file.server.unwrap_or_default();
        let realtime = file.realtime.unwrap_or_default();
        let drawing = file.drawing.unwrap_or_default();
        let image = file.image.unwrap_or_default();

        let server = ServerSettings {
            host: server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: server.port.unwrap_or(DEFAULT_PORT),
            cors_allowed_origins: server
                .cors_allowed_origins
                .as_deref()
                .unwrap_or(DEFAULT_CORS_ORIGINS)
                .parse()?,
        };
        let realtime = RealtimeSettings {
            async_mode: match realtime.async_mode.as_deref() {
                Some(mode) => mode.parse()?,
                None => AsyncMode::Eventlet,
            },
            max_http_buffer_size: realtime
                .max_http_buffer_size
                .unwrap_or(DEFAULT_MAX_HTTP_BUFFER_SIZE),
        };
        let model = ModelSettings {
            path: file
                .model
                .and_then(|model| model.path)
                .unwrap_or_else(default_model_path),
        };
        let drawing = DrawSettings {
            bbox_color: drawing.bbox_color.unwrap_or(DEFAULT_BBOX_COLOR),
            bbox_thickness: drawing.bbox_thickness.unwrap_or(DEFAULT_BBOX_THICKNESS),
            font_scale: drawing.font_scale.unwrap_or(DEFAULT_FONT_SCALE),
            font_thickness: drawing.font_thickness.unwrap_or(DEFAULT_FONT_THICKNESS),
        };
        let image = ImageSettings {
            encoding: match image.encoding.as_deref() {
                Some(ext) => ext.parse()?,
                None => ImageEncoding::Jpeg,
            },
            quality: image.quality.unwrap_or(DEFAULT_IMAGE_QUALITY),
        };
        Ok(Self {
            server,
            realtime,
            model,
            drawing,
            image,
        })
    }

    fn apply_env<E: EnvSource + ?Sized>(&mut self, env: &E) -> Result<()> {
        self.server.port = env::resolve(
            env,
            PORT_VAR,
            "an integer port number (0-65535)",
            |raw| raw.parse().ok(),
            self.server.port,
        )?;
        if let Some(path) = env::non_empty(env, MODEL_PATH_VAR) {
            self.model.path = PathBuf::from(path);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("server host must not be empty"));
        }
        if self.realtime.max_http_buffer_size == 0 {
            return Err(anyhow!("max_http_buffer_size must be greater than zero"));
        }
        if self.drawing.bbox_thickness == 0 {
            return Err(anyhow!("bbox_thickness must be at least 1"));
        }
        if !self.drawing.font_scale.is_finite() || self.drawing.font_scale <= 0.0 {
            return Err(anyhow!("font_scale must be a positive number"));
        }
        if self.drawing.font_thickness == 0 {
            return Err(anyhow!("font_thickness must be at least 1"));
        }
        if self.image.quality > 100 {
            return Err(anyhow!(
                "image quality must be between 0 and 100, got {}",
                self.image.quality
            ));
        }
        Ok(())
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn realtime(&self) -> &RealtimeSettings {
        &self.realtime
    }

    pub fn model(&self) -> &ModelSettings {
        &self.model
    }

    pub fn drawing(&self) -> &DrawSettings {
        &self.drawing
    }

    pub fn image(&self) -> &ImageSettings {
        &self.image
    }

    pub fn host(&self) -> &str {
        &self.server.host
    }

    pub fn port(&self) -> u16 {
        self.server.port
    }

    pub fn model_path(&self) -> &Path {
        &self.model.path
    }

    /// "host:port" for binding the server socket.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_with(pairs: &[(&'static str, &'static str)]) -> Result<AppConfig> {
        let env: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::resolve(&env)
    }

    #[test]
    fn defaults_apply_without_env() -> Result<()> {
        let cfg = resolve_with(&[])?;
        assert_eq!(cfg.host(), "0.0.0.0");
        assert_eq!(cfg.port(), 8080);
        assert_eq!(cfg.server().cors_allowed_origins, AllowedOrigins::Any);
        assert_eq!(cfg.realtime().async_mode, AsyncMode::Eventlet);
        assert_eq!(cfg.realtime().max_http_buffer_size, 100_000_000);
        assert_eq!(cfg.drawing().bbox_color, [0, 255, 0]);
        assert_eq!(cfg.drawing().bbox_thickness, 2);
        assert_eq!(cfg.drawing().font_scale, 0.5);
        assert_eq!(cfg.drawing().font_thickness, 1);
        assert_eq!(cfg.image().encoding, ImageEncoding::Jpeg);
        assert_eq!(cfg.image().encoding.extension(), ".jpg");
        assert_eq!(cfg.image().quality, 90);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        Ok(())
    }

    #[test]
    fn port_env_overrides_default() -> Result<()> {
        let cfg = resolve_with(&[("PORT", "9090")])?;
        assert_eq!(cfg.port(), 9090);
        Ok(())
    }

    #[test]
    fn malformed_port_names_the_variable() {
        let err = resolve_with(&[("PORT", "notanumber")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("PORT"), "{msg}");
        assert!(msg.contains("integer"), "{msg}");
    }

    #[test]
    fn blank_port_is_rejected() {
        for blank in ["", "   "] {
            let err = resolve_with(&[("PORT", blank)]).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("PORT"), "{msg}");
            assert!(msg.contains("integer"), "{msg}");
        }
    }

    #[test]
    fn blank_model_path_keeps_computed_default() -> Result<()> {
        for blank in ["", "   "] {
            let cfg = resolve_with(&[("MODEL_PATH", blank)])?;
            assert_eq!(cfg.model_path(), default_model_path().as_path());
        }
        Ok(())
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(resolve_with(&[("PORT", "70000")]).is_err());
        assert!(resolve_with(&[("PORT", "-1")]).is_err());
    }

    #[test]
    fn default_model_path_is_anchored_to_source_dir() -> Result<()> {
        let cfg = resolve_with(&[])?;
        let path = cfg.model_path();
        assert!(path.is_absolute(), "{}", path.display());
        assert!(path.ends_with(DEFAULT_MODEL_FILENAME));
        assert_eq!(path.parent(), Some(Path::new(CONFIG_SOURCE_DIR)));
        Ok(())
    }

    #[test]
    fn model_path_env_is_taken_verbatim() -> Result<()> {
        let cfg = resolve_with(&[("MODEL_PATH", "/custom/path/model.pt")])?;
        assert_eq!(cfg.model_path(), Path::new("/custom/path/model.pt"));

        let cfg = resolve_with(&[("MODEL_PATH", "weights/../model.pt")])?;
        assert_eq!(cfg.model_path().to_str(), Some("weights/../model.pt"));
        Ok(())
    }

    #[test]
    fn resolution_is_idempotent() -> Result<()> {
        let pairs = [("PORT", "9091"), ("MODEL_PATH", "/m.pt")];
        assert_eq!(resolve_with(&pairs)?, resolve_with(&pairs)?);
        Ok(())
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = resolve_with(&[("STATION_VISION_CONFIG", "/nonexistent/station.json")])
            .unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn allowed_origins_parse_list() -> Result<()> {
        let origins: AllowedOrigins = "https://a.example, https://b.example".parse()?;
        assert!(origins.allows("https://a.example"));
        assert!(!origins.allows("https://c.example"));
        assert_eq!(origins.to_string(), "https://a.example,https://b.example");
        assert!(AllowedOrigins::Any.allows("https://anything"));
        assert!("*, https://a.example".parse::<AllowedOrigins>().is_err());
        assert!(" , ".parse::<AllowedOrigins>().is_err());
        Ok(())
    }

    #[test]
    fn async_mode_parses_known_backends() -> Result<()> {
        for mode in [
            AsyncMode::Eventlet,
            AsyncMode::Gevent,
            AsyncMode::Threading,
            AsyncMode::Asgi,
        ] {
            assert_eq!(mode.as_str().parse::<AsyncMode>()?, mode);
        }
        assert!("tokio".parse::<AsyncMode>().is_err());
        Ok(())
    }
}
