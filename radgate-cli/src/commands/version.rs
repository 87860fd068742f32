//! Version subcommand implementation

pub fn run() {
    println!("radgate {}", env!("CARGO_PKG_VERSION"));
    println!("plugins: {}", radgate_plugin::PluginRegistry::with_builtins().names().join(", "));

    #[cfg(target_os = "linux")]
    println!("target: linux");
    #[cfg(target_os = "macos")]
    println!("target: macos");
    #[cfg(target_os = "windows")]
    println!("target: windows");
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    println!("target: unknown");
}
