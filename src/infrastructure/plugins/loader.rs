//! Plugin loader - Dynamically loads plugin units from shared libraries

use std::path::Path;
use libloading::{Library, Symbol};
use crate::application::errors::PluginError;
use crate::plugins::Plugin;

/// Symbol every plugin library must export, see [`declare_plugin!`](crate::declare_plugin)
pub const INIT_SYMBOL: &[u8] = b"slask_plugin_init";

/// Function signature for plugin initialization
#[allow(improper_ctypes_definitions)]
pub type PluginInitFn = unsafe extern "C" fn() -> *mut dyn Plugin;

/// A plugin unit that loaded successfully.
///
/// Field order matters: the instance is dropped before the library whose code
/// it points into.
pub struct LoadedUnit {
    name: String,
    instance: Box<dyn Plugin>,
    library: Option<Library>,
}

impl LoadedUnit {
    /// A unit compiled into the binary
    pub fn builtin(instance: Box<dyn Plugin>) -> Self {
        Self {
            name: instance.name().to_string(),
            instance,
            library: None,
        }
    }

    /// A unit whose name comes from where it was found rather than from the plugin itself
    pub fn named(name: impl Into<String>, instance: Box<dyn Plugin>) -> Self {
        Self {
            name: name.into(),
            instance,
            library: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }

    pub fn is_library(&self) -> bool {
        self.library.is_some()
    }
}

/// Turns a candidate file into a loaded unit
pub trait PluginLoader {
    /// Whether this loader knows how to load the candidate at all
    fn accepts(&self, path: &Path) -> bool;

    fn load(&self, path: &Path) -> Result<LoadedUnit, PluginError>;
}

/// Loads `cdylib` plugins through `libloading`
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

impl LibraryLoader {
    pub fn new() -> Self {
        Self
    }
}

impl PluginLoader for LibraryLoader {
    fn accepts(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("so") | Some("dylib") | Some("dll")
        )
    }

    fn load(&self, path: &Path) -> Result<LoadedUnit, PluginError> {
        let name = unit_name(path)
            .ok_or_else(|| PluginError::Load(format!("Bad plugin file name: {}", path.display())))?;

        let library = unsafe {
            Library::new(path)
                .map_err(|e| PluginError::Load(format!("Failed to load library: {}", e)))?
        };

        let instance = unsafe {
            let init_fn: Symbol<PluginInitFn> = library
                .get(INIT_SYMBOL)
                .map_err(|e| PluginError::Load(format!("Failed to find init function: {}", e)))?;

            let plugin_ptr = init_fn();
            if plugin_ptr.is_null() {
                return Err(PluginError::Load("Plugin init returned null".to_string()));
            }
            Box::from_raw(plugin_ptr)
        };

        tracing::debug!("Loaded library plugin {} from {}", name, path.display());

        Ok(LoadedUnit {
            name,
            instance,
            library: Some(library),
        })
    }
}

/// File stem, minus the `lib` prefix cargo puts on unix cdylibs
pub fn unit_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let stem = match path.extension().and_then(|e| e.to_str()) {
        Some("so") | Some("dylib") => stem.strip_prefix("lib").unwrap_or(stem),
        _ => stem,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Export a plugin constructor from a `cdylib` crate
#[macro_export]
macro_rules! declare_plugin {
    ($ctor:expr) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn slask_plugin_init() -> *mut dyn $crate::plugins::Plugin {
            let plugin: ::std::boxed::Box<dyn $crate::plugins::Plugin> = ::std::boxed::Box::new($ctor);
            ::std::boxed::Box::into_raw(plugin)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_accepts_shared_libraries_only() {
        let loader = LibraryLoader::new();
        assert!(loader.accepts(Path::new("plugins/libweather.so")));
        assert!(loader.accepts(Path::new("plugins/weather.dylib")));
        assert!(loader.accepts(Path::new("plugins/weather.dll")));
        assert!(!loader.accepts(Path::new("plugins/README.md")));
        assert!(!loader.accepts(Path::new("plugins/weather")));
    }

    #[test]
    fn test_unit_name() {
        assert_eq!(unit_name(&PathBuf::from("plugins/libweather.so")).as_deref(), Some("weather"));
        assert_eq!(unit_name(&PathBuf::from("plugins/weather.dll")).as_deref(), Some("weather"));
        assert_eq!(unit_name(&PathBuf::from("plugins/lib.so")).as_deref(), None);
    }

    #[test]
    fn test_garbage_library_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libbroken.so");
        std::fs::write(&path, b"def on_message(:\n").unwrap();

        let err = LibraryLoader::new().load(&path).err().unwrap();
        assert!(matches!(err, PluginError::Load(_)));
    }
}
