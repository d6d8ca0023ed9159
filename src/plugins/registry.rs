//! Plugin registry - discovers plugin units and builds the hook table

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::application::errors::PluginError;
use crate::infrastructure::config::PluginConfig;
use crate::infrastructure::plugins::loader::{LoadedUnit, PluginLoader};
use crate::plugins::builtin;
use crate::plugins::guard;
use crate::plugins::trait_def::{Handler, Plugin};

/// One registered handler and the unit it came from
#[derive(Clone)]
pub struct HookEntry {
    pub plugin: String,
    pub handler: Handler,
}

/// Hook name to handlers, in discovery order
pub type HookTable = HashMap<String, Vec<HookEntry>>;

/// Help text per plugin name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HelpIndex {
    pub short: BTreeMap<String, String>,
    pub extended: BTreeMap<String, String>,
}

impl HelpIndex {
    fn record(&mut self, plugin: &str, description: &str) {
        let first_line = description.lines().next().unwrap_or("").trim();
        self.short.insert(plugin.to_string(), first_line.to_string());
        self.extended.insert(plugin.to_string(), description.to_string());
    }
}

/// Registry of loaded plugin units.
///
/// Built once at start-up and read-only afterwards. Units are kept alive for
/// the lifetime of the registry and dropped after the hook table.
#[derive(Default)]
pub struct PluginRegistry {
    hooks: HookTable,
    help: HelpIndex,
    units: Vec<LoadedUnit>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover every plugin unit in `directory` using `loader`.
    ///
    /// Never fails: units that cannot be loaded are logged and skipped.
    pub fn discover(directory: impl AsRef<Path>, loader: &dyn PluginLoader) -> Self {
        let mut registry = Self::new();
        registry.load_directory(directory.as_ref(), loader);
        registry
    }

    /// The configured built-ins, in configured order, then the plugin directory
    pub fn from_config(config: &PluginConfig, loader: &dyn PluginLoader) -> Self {
        let mut registry = Self::new();
        for name in &config.builtins {
            match builtin::builtin(name) {
                Some(plugin) => registry.register_builtin(plugin),
                None => warn!("Unknown built-in plugin '{}', skipping", name),
            }
        }
        registry.load_directory(&config.directory, loader);
        registry
    }

    /// Register a unit compiled into the binary
    pub fn register_builtin(&mut self, plugin: Box<dyn Plugin>) {
        self.register(LoadedUnit::builtin(plugin));
    }

    /// Load the directory's candidates, in file name order, after whatever is already registered
    pub fn load_directory(&mut self, directory: &Path, loader: &dyn PluginLoader) {
        for path in candidates(directory) {
            if !loader.accepts(&path) {
                debug!("Skipping {}: not a plugin unit", path.display());
                continue;
            }
            debug!("plugin: {}", path.display());

            let loaded = guard::catch(|| loader.load(&path))
                .unwrap_or_else(|report| Err(PluginError::Load(format!("panicked: {}", report))));

            match loaded {
                Ok(unit) => self.register(unit),
                Err(e) => {
                    warn!("Import failed on plugin {}, plugin not loaded: {}", path.display(), e);
                }
            }
        }
    }

    fn register(&mut self, unit: LoadedUnit) {
        let name = unit.name().to_string();
        if self.units.iter().any(|u| u.name() == name) {
            warn!("Plugin '{}' already registered, skipping duplicate", name);
            return;
        }

        let hooks = match guard::catch(|| unit.plugin().hooks()) {
            Ok(hooks) => hooks,
            Err(report) => {
                warn!("Plugin '{}' panicked while listing hooks: {}", name, report);
                return;
            }
        };

        for (hook, handler) in hooks {
            if hook.is_empty() {
                warn!("Plugin '{}' registered a handler with an empty hook name, ignoring it", name);
                continue;
            }
            debug!("attaching {}.on_{} to {}", name, hook, hook);
            self.hooks.entry(hook).or_default().push(HookEntry {
                plugin: name.clone(),
                handler,
            });
        }

        if let Some(description) = unit.plugin().description() {
            self.help.record(&name, description);
        }

        if unit.is_library() {
            info!("Loaded plugin: {} (shared library)", name);
        } else {
            info!("Loaded plugin: {}", name);
        }
        self.units.push(unit);
    }

    /// Handlers for `hook`, in registration order
    pub fn handlers(&self, hook: &str) -> &[HookEntry] {
        self.hooks.get(hook).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    pub fn help(&self) -> &HelpIndex {
        &self.help
    }

    /// Plugin names, in load order
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    /// Hook name to owning plugin names, for logging and tests
    pub fn hook_order(&self) -> BTreeMap<String, Vec<String>> {
        self.hooks
            .iter()
            .map(|(hook, entries)| (hook.clone(), entries.iter().map(|e| e.plugin.clone()).collect()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Immediate, regular, non-hidden files of `directory`, sorted by file name
fn candidates(directory: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Plugin directory {} unreadable: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        // Skip hidden and private files
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if !name.starts_with('.') && !name.starts_with('_') => paths.push(path),
            _ => continue,
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::trait_def::FnPlugin;
    use std::fs;

    /// Loads `*.plug` files: the content lists one hook per line, `!` fails the load
    struct LineLoader;

    impl PluginLoader for LineLoader {
        fn accepts(&self, path: &Path) -> bool {
            path.extension().and_then(|e| e.to_str()) == Some("plug")
        }

        fn load(&self, path: &Path) -> Result<LoadedUnit, PluginError> {
            let content = fs::read_to_string(path).map_err(|e| PluginError::Load(e.to_string()))?;
            if content.starts_with('!') {
                return Err(PluginError::Load("syntax error".to_string()));
            }
            if content.starts_with("panic") {
                panic!("boom while importing");
            }
            let name = path.file_stem().unwrap().to_str().unwrap().to_string();
            let mut plugin = FnPlugin::new(name.clone());
            for hook in content.lines().filter(|l| !l.is_empty()) {
                if let Some(doc) = hook.strip_prefix("doc:") {
                    plugin = plugin.with_description(doc.replace("\\n", "\n"));
                    continue;
                }
                plugin = plugin.on(hook, |_, _| Ok(None));
            }
            Ok(LoadedUnit::named(name, Box::new(plugin)))
        }
    }

    fn plugin_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_discovery_orders_by_file_name() {
        let dir = plugin_dir(&[
            ("zeta.plug", "message\n"),
            ("alpha.plug", "message\ninit\n"),
            ("mid.plug", "message\n"),
        ]);

        let registry = PluginRegistry::discover(dir.path(), &LineLoader);
        let order = registry.hook_order();
        assert_eq!(order["message"], vec!["alpha", "mid", "zeta"]);
        assert_eq!(order["init"], vec!["alpha"]);
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let dir = plugin_dir(&[("b.plug", "message\n"), ("a.plug", "message\n"), ("c.plug", "init\nmessage\n")]);

        let first = PluginRegistry::discover(dir.path(), &LineLoader).hook_order();
        let second = PluginRegistry::discover(dir.path(), &LineLoader).hook_order();
        assert_eq!(first, second);
    }

    #[test]
    fn test_broken_unit_is_skipped() {
        let dir = plugin_dir(&[("bad.plug", "!not valid\n"), ("good.plug", "message\n")]);

        let registry = PluginRegistry::discover(dir.path(), &LineLoader);
        assert_eq!(registry.names(), vec!["good"]);
        assert_eq!(registry.handlers("message").len(), 1);
        assert_eq!(registry.handlers("message")[0].plugin, "good");
    }

    #[test]
    fn test_panicking_unit_is_skipped() {
        let dir = plugin_dir(&[("a.plug", "panic\n"), ("b.plug", "init\n")]);

        let registry = PluginRegistry::discover(dir.path(), &LineLoader);
        assert_eq!(registry.names(), vec!["b"]);
    }

    #[test]
    fn test_hidden_private_and_foreign_files_ignored() {
        let dir = plugin_dir(&[
            (".hidden.plug", "message\n"),
            ("_private.plug", "message\n"),
            ("notes.txt", "message\n"),
            ("real.plug", "message\n"),
        ]);
        fs::create_dir(dir.path().join("nested.plug")).unwrap();

        let registry = PluginRegistry::discover(dir.path(), &LineLoader);
        assert_eq!(registry.names(), vec!["real"]);
    }

    #[test]
    fn test_missing_directory_yields_empty_registry() {
        let registry = PluginRegistry::discover("/nonexistent/slask/plugins", &LineLoader);
        assert!(registry.is_empty());
        assert!(registry.handlers("message").is_empty());
    }

    #[test]
    fn test_help_index() {
        let dir = plugin_dir(&[("weather.plug", "doc:!weather <city>: forecast\\nUses the public API\nmessage\n")]);

        let registry = PluginRegistry::discover(dir.path(), &LineLoader);
        assert_eq!(registry.help().short["weather"], "!weather <city>: forecast");
        assert_eq!(registry.help().extended["weather"], "!weather <city>: forecast\nUses the public API");
    }

    #[test]
    fn test_builtins_precede_directory_units() {
        let dir = plugin_dir(&[("aaa.plug", "message\n")]);

        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("zz").on("message", |_, _| Ok(None))));
        registry.load_directory(dir.path(), &LineLoader);
        assert_eq!(registry.hook_order()["message"], vec!["zz", "aaa"]);
    }

    #[test]
    fn test_from_config_orders_builtins_then_directory() {
        let dir = plugin_dir(&[("aaa.plug", "message\n"), ("echo.plug", "message\n")]);
        let config = PluginConfig {
            directory: dir.path().to_path_buf(),
            builtins: vec!["log".to_string(), "nope".to_string(), "echo".to_string()],
        };

        let registry = PluginRegistry::from_config(&config, &LineLoader);
        assert_eq!(registry.names(), vec!["log", "echo", "aaa"]);
        assert_eq!(registry.hook_order()["message"], vec!["log", "echo", "aaa"]);
    }

    #[test]
    fn test_empty_hook_name_and_duplicates_ignored() {
        let mut registry = PluginRegistry::new();
        registry.register_builtin(Box::new(FnPlugin::new("echo").on("", |_, _| Ok(None)).on("message", |_, _| Ok(None))));
        registry.register_builtin(Box::new(FnPlugin::new("echo").on("message", |_, _| Ok(None))));

        assert_eq!(registry.len(), 1);
        assert!(registry.handlers("").is_empty());
        assert_eq!(registry.handlers("message").len(), 1);
    }
}
