use crate::{browser::config::{BrowserFamily, ConnectionOptions, DownloadSettings, LaunchOptions},
            dom::ElementNode,
            error::{Result, WatchError},
            network::{NetworkWatch, UrlPattern},
            page::{ClickMode, CookieRecord, Page, PageError}};
use headless_chrome::{Browser, Element, Tab,
                      protocol::cdp::{Network::CookieParam, Page as CdpPage, types::Event}};
use std::{ffi::{OsStr, OsString},
          sync::{Arc, Mutex,
                 atomic::{AtomicU64, Ordering},
                 mpsc},
          time::Duration};

const SNAPSHOT_JS: &str = include_str!("snapshot.js");

/// Browser session that drives a single Chrome/Chromium tab
pub struct BrowserSession {
    /// Keeps the browser process alive for as long as the session
    _browser: Browser,

    tab: Arc<Tab>,

    /// Uncaught exceptions reported by the page, drained by the runner
    page_errors: Arc<Mutex<Vec<PageError>>>,

    next_watch: AtomicU64,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        if options.family != BrowserFamily::Chromium {
            return Err(WatchError::LaunchFailed(format!(
                "{:?} browsers cannot be driven over the DevTools protocol",
                options.family
            )));
        }
        let plan = options.launch_plan();
        let extra_args: Vec<OsString> = plan.args.iter().map(OsString::from).collect();

        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.extend(extra_args.iter().map(OsString::as_os_str));

        // A scenario with retries can outlive the 30s default
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path.clone();
        launch_opts.user_data_dir = options.user_data_dir.clone();
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| WatchError::LaunchFailed(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| WatchError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        let session = Self::attach(browser, tab, options.default_timeout)?;
        if let Some(download) = &plan.download {
            session.apply_download_settings(download)?;
        }
        Ok(session)
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| WatchError::ConnectionFailed(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| WatchError::ConnectionFailed(format!("Failed to create tab: {}", e)))?;

        Self::attach(browser, tab, Duration::from_millis(options.timeout))
    }

    fn attach(browser: Browser, tab: Arc<Tab>, default_timeout: Duration) -> Result<Self> {
        tab.set_default_timeout(default_timeout);

        let page_errors = Arc::new(Mutex::new(Vec::new()));
        let sink = page_errors.clone();
        tab.enable_runtime().map_err(|e| WatchError::LaunchFailed(format!("Failed to enable runtime events: {}", e)))?;
        tab.add_event_listener(Arc::new(move |event: &Event| {
            if let Event::RuntimeExceptionThrown(thrown) = event {
                let details = &thrown.params.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|exception| exception.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                let stack = details.stack_trace.as_ref().map(|trace| {
                    trace.call_frames.iter().map(|frame| frame.url.clone()).collect::<Vec<_>>().join("\n")
                });
                if let Ok(mut errors) = sink.lock() {
                    errors.push(PageError { message, source_url: details.url.clone(), stack });
                }
            }
        }))
        .map_err(|e| WatchError::LaunchFailed(format!("Failed to listen for page errors: {}", e)))?;

        Ok(Self { _browser: browser, tab, page_errors, next_watch: AtomicU64::new(0) })
    }

    fn apply_download_settings(&self, download: &DownloadSettings) -> Result<()> {
        std::fs::create_dir_all(&download.directory)?;
        let behavior = if download.prompt_for_download {
            CdpPage::SetDownloadBehaviorBehaviorOption::Default
        } else {
            CdpPage::SetDownloadBehaviorBehaviorOption::Allow
        };
        self.tab
            .call_method(CdpPage::SetDownloadBehavior {
                behavior,
                download_path: Some(download.directory.to_string_lossy().into_owned()),
            })
            .map_err(|e| WatchError::LaunchFailed(format!("Failed to set download behavior: {}", e)))?;
        Ok(())
    }

    fn wait_for_navigation(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| WatchError::NavigationFailed(format!("Navigation timeout: {}", e)))?;
        Ok(())
    }

    /// Evaluate an expression that returns a JSON string and decode it
    fn evaluate_json<T: serde::de::DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| WatchError::EvaluationFailed(e.to_string()))?;

        let json_value = result
            .value
            .ok_or_else(|| WatchError::DomParseFailed("No value returned from snapshot".to_string()))?;

        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| WatchError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        serde_json::from_str(&json_str)
            .map_err(|e| WatchError::DomParseFailed(format!("Failed to parse snapshot JSON: {}", e)))
    }

    /// Outer HTML of every match, parsed into snapshots
    fn snapshot(&self, op: &str, scope: Option<u64>, selector: &str) -> Result<Vec<ElementNode>> {
        let expression = format!(
            "({})({}, {}, {})",
            SNAPSHOT_JS.trim_end(),
            serde_json::json!(op),
            serde_json::json!(scope),
            serde_json::json!(selector)
        );
        let markup: Vec<String> = self.evaluate_json(&expression)?;
        markup.iter().map(|html| ElementNode::from_html(html)).collect()
    }

    /// Resolve a snapshot back to the live element it was taken from
    fn element(&self, node: &ElementNode) -> Result<Element<'_>> {
        let selector = node.ref_selector().ok_or_else(|| unresolved(node))?;

        self.tab
            .find_element(&selector)
            .map_err(|e| WatchError::ElementNotFound(format!("{}: {}", node.to_simple_string(), e)))
    }

    fn call_on(&self, node: &ElementNode, function: &str) -> Result<()> {
        self.element(node)?
            .call_js_fn(function, vec![], false)
            .map_err(|e| WatchError::EvaluationFailed(format!("{} on {}: {}", function, node.to_simple_string(), e)))?;
        Ok(())
    }

    fn run_script(&self, expression: &str) -> Result<()> {
        self.tab.evaluate(expression, false).map_err(|e| WatchError::EvaluationFailed(e.to_string()))?;
        Ok(())
    }
}

impl Page for BrowserSession {
    fn visit(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| WatchError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;
        self.wait_for_navigation()
    }

    fn reload(&self) -> Result<()> {
        self.tab.reload(false, None).map_err(|e| WatchError::NavigationFailed(format!("Failed to reload: {}", e)))?;
        self.wait_for_navigation()
    }

    fn query(&self, scope: Option<&ElementNode>, selector: &str) -> Result<Vec<ElementNode>> {
        let scope_ref = match scope {
            Some(node) => Some(node.node_ref.ok_or_else(|| {
                WatchError::ElementNotFound(format!("scope {} was not returned by a query", node.to_simple_string()))
            })?),
            None => None,
        };
        self.snapshot("query", scope_ref, selector)
    }

    fn closest(&self, node: &ElementNode, selector: &str) -> Result<Option<ElementNode>> {
        let node_ref = node.node_ref.ok_or_else(|| unresolved(node))?;
        Ok(self.snapshot("closest", Some(node_ref), selector)?.into_iter().next())
    }

    fn click(&self, node: &ElementNode, mode: ClickMode) -> Result<()> {
        match mode {
            ClickMode::Pointer => {
                self.element(node)?.click().map_err(|e| {
                    WatchError::ElementNotFound(format!("Failed to click {}: {}", node.to_simple_string(), e))
                })?;
                Ok(())
            }
            ClickMode::Forced => self.call_on(node, "function() { this.click(); }"),
        }
    }

    fn clear(&self, node: &ElementNode) -> Result<()> {
        self.call_on(
            node,
            "function() { this.focus(); this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
        )
    }

    fn type_text(&self, node: &ElementNode, text: &str) -> Result<()> {
        self.element(node)?.type_into(text).map_err(|e| {
            WatchError::EvaluationFailed(format!("Failed to type into {}: {}", node.to_simple_string(), e))
        })?;
        Ok(())
    }

    fn press_enter(&self, node: &ElementNode) -> Result<()> {
        self.element(node)?
            .focus()
            .map_err(|e| WatchError::EvaluationFailed(format!("Failed to focus {}: {}", node.to_simple_string(), e)))?;
        self.tab.press_key("Enter").map_err(|e| WatchError::EvaluationFailed(format!("Failed to press Enter: {}", e)))?;
        Ok(())
    }

    fn scroll_into_view(&self, node: &ElementNode) -> Result<()> {
        self.call_on(node, "function() { this.scrollIntoView({ block: 'center' }); }")
    }

    fn set_cookie(&self, cookie: &CookieRecord) -> Result<()> {
        self.tab
            .set_cookies(vec![cookie_param(cookie)?])
            .map_err(|e| WatchError::EvaluationFailed(format!("Failed to set cookie {}: {}", cookie.name, e)))?;
        Ok(())
    }

    fn cookies(&self) -> Result<Vec<CookieRecord>> {
        let cookies = self
            .tab
            .get_cookies()
            .map_err(|e| WatchError::EvaluationFailed(format!("Failed to read cookies: {}", e)))?;
        Ok(cookies
            .into_iter()
            .map(|c| CookieRecord {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
                expires: if c.session { None } else { Some(c.expires) },
            })
            .collect())
    }

    fn inject_style(&self, css: &str) -> Result<()> {
        self.run_script(&format!(
            "(function(css) {{ \
               const style = document.createElement('style'); \
               style.textContent = css; \
               document.head.appendChild(style); \
             }})({});",
            serde_json::json!(css)
        ))
    }

    fn observe_network(&self, pattern: &UrlPattern) -> Result<NetworkWatch> {
        pattern.validate()?;

        let (sender, receiver) = mpsc::channel::<String>();
        let handler_name = format!("bsw-watch-{}", self.next_watch.fetch_add(1, Ordering::Relaxed));

        self.tab
            .register_response_handling(
                handler_name.clone(),
                Box::new(move |params, _fetch_body| {
                    let _ = sender.send(params.response.url.clone());
                }),
            )
            .map_err(|e| WatchError::EvaluationFailed(format!("Failed to observe network: {}", e)))?;

        let tab = self.tab.clone();
        Ok(NetworkWatch::new(pattern.clone(), receiver).with_cleanup(move || {
            if let Err(e) = tab.deregister_response_handling(&handler_name) {
                log::debug!("Failed to remove response handler {}: {}", handler_name, e);
            }
        }))
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(CdpPage::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| WatchError::EvaluationFailed(format!("Failed to capture screenshot: {}", e)))
    }

    fn drain_page_errors(&self) -> Result<Vec<PageError>> {
        let mut errors = self
            .page_errors
            .lock()
            .map_err(|e| WatchError::EvaluationFailed(format!("Page error buffer poisoned: {}", e)))?;
        Ok(std::mem::take(&mut *errors))
    }
}

/// Protocol form of a cookie; no URL is set, so the tab fills in the current one
fn cookie_param(cookie: &CookieRecord) -> Result<CookieParam> {
    let mut param = serde_json::json!({
        "name": cookie.name,
        "value": cookie.value,
        "path": cookie.path,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    if let Some(domain) = &cookie.domain {
        param["domain"] = serde_json::json!(domain);
    }
    if let Some(expires) = cookie.expires {
        param["expires"] = serde_json::json!(expires);
    }
    serde_json::from_value(param)
        .map_err(|e| WatchError::EvaluationFailed(format!("Invalid cookie {}: {}", cookie.name, e)))
}

fn unresolved(node: &ElementNode) -> WatchError {
    WatchError::ElementNotFound(format!("{} was not returned by a query", node.to_simple_string()))
}
