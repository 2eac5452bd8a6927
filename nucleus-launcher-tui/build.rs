fn main() {
    if cfg!(target_os = "windows") {
        let icon = std::path::Path::new("icon.ico");
        if !icon.exists() {
            println!("cargo:warning=icon.ico not found; building without an icon");
            return;
        }
        let mut res = winres::WindowsResource::new();
        res.set_icon("icon.ico");
        res.set("ProductName", "Nucleus Launcher");
        res.set("FileDescription", "Nucleus Roblox Launcher");
        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}
