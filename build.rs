fn main() {
    #[cfg(windows)]
    {
        use std::env;
        use std::path::PathBuf;

        let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
            return;
        };
        let ico_path = PathBuf::from(&manifest_dir)
            .join("resources")
            .join("launcher-icon.ico");

        // 아이콘이 없으면 기본 아이콘으로 빌드
        if ico_path.exists() {
            let mut res = winres::WindowsResource::new();
            res.set_icon(&ico_path.to_string_lossy());
            res.set("FileDescription", "Nucleus Launcher");

            if let Err(e) = res.compile() {
                println!("cargo:warning=Failed to compile resources: {}", e);
            }
        } else {
            println!("cargo:warning=Icon not found at {}; building without one", ico_path.display());
        }
    }
}
