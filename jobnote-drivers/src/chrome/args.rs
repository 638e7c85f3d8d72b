use jobnote_common::BrowserSettings;
use serde_json::json;
use webdriver::capabilities::Capabilities;

/// Construct Chrome command-line arguments for the configured session.
pub fn build_chrome_arguments(settings: &BrowserSettings) -> Vec<String> {
    let (width, height) = settings.window_size;
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--lang=en-US".to_string(),
        format!("--user-agent={}", settings.user_agent),
        format!("--window-size={width},{height}"),
    ];
    if settings.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    if !settings.sandbox {
        args.push("--no-sandbox".to_string());
    }
    args
}

/// W3C capabilities requesting a Chrome session with [`build_chrome_arguments`].
pub fn chrome_capabilities(settings: &BrowserSettings) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": build_chrome_arguments(settings) }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_headless_and_sandboxed() {
        let args = build_chrome_arguments(&BrowserSettings::default());
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
        assert!(!args.contains(&"--no-sandbox".to_string()));
        assert!(args
            .iter()
            .any(|a| a.starts_with("--user-agent=Mozilla/5.0 (Windows NT 10.0")));
    }

    #[test]
    fn sandbox_can_be_disabled_for_containers() {
        let settings = BrowserSettings {
            sandbox: false,
            headless: false,
            window_size: (1280, 800),
            ..BrowserSettings::default()
        };
        let args = build_chrome_arguments(&settings);
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(args.contains(&"--window-size=1280,800".to_string()));
    }

    #[test]
    fn capabilities_carry_chrome_options() {
        let caps = chrome_capabilities(&BrowserSettings::default());
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--disable-dev-shm-usage"));
        assert_eq!(caps["browserName"], "chrome");
    }
}
