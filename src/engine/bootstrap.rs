use crate::engine::location::{LocationResolver, Resolution};
use crate::engine::zip::{ModalExit, ZipSetter};
use crate::error::Result;
use crate::page::{CookieRecord, Page};
use crate::profile::SiteProfile;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Locale state established once and replayed into later pages
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleSession {
    pub key: String,
    pub zip: String,
    pub cookies: Vec<CookieRecord>,
    pub established_at: DateTime<Utc>,
}

/// Result of [`SessionStore::ensure_established`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// The UI flow ran and its result was cached
    Established,
    /// Cookies were replayed from the cache
    Restored,
}

/// Runs the expensive locale setup: cookies, region indicator, delivery zip, animation off
#[derive(Debug, Clone)]
pub struct SessionBootstrap {
    base_url: String,
    zip: String,
    locale_cookies: Vec<CookieRecord>,
    stabilize_css: String,
    resolver: LocationResolver,
    zip_setter: ZipSetter,
}

impl SessionBootstrap {
    pub fn new(profile: &SiteProfile, base_url: impl Into<String>, zip: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        Ok(Self {
            resolver: LocationResolver::new(&profile.location, base_url.clone())?,
            zip_setter: ZipSetter::new(&profile.zip)?,
            base_url,
            zip: zip.into(),
            locale_cookies: profile.locale_cookies.clone(),
            stabilize_css: profile.stabilize_css.clone(),
        })
    }

    /// Builder method: replace the location resolver (e.g. different retry count)
    pub fn with_resolver(mut self, resolver: LocationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Builder method: replace the zip setter (e.g. different timeout)
    pub fn with_zip_setter(mut self, zip_setter: ZipSetter) -> Self {
        self.zip_setter = zip_setter;
        self
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    /// Drive the full UI flow on `page`
    pub fn establish<P: Page + ?Sized>(&self, page: &P) -> Result<(Resolution, ModalExit)> {
        page.visit(&self.base_url)?;
        for cookie in &self.locale_cookies {
            page.set_cookie(cookie)?;
        }

        let resolution = self.resolver.ensure(page)?;
        let exit = self.zip_setter.set(page, &self.zip)?;
        self.stabilize(page)?;
        Ok((resolution, exit))
    }

    /// Switch off transitions, animations and smooth scrolling for the current document
    pub fn stabilize<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
        page.inject_style(&self.stabilize_css)
    }

    /// Put cached cookies back without touching the UI
    pub fn restore<P: Page + ?Sized>(&self, page: &P, session: &LocaleSession) -> Result<()> {
        page.visit(&self.base_url)?;
        for cookie in &session.cookies {
            page.set_cookie(cookie)?;
        }
        Ok(())
    }
}

/// Keyed cache of established locale sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, LocaleSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish the session for `key` once; later calls replay its cookies.
    ///
    /// A failed bootstrap caches nothing, so the next scenario starts clean.
    pub fn ensure_established<P: Page + ?Sized>(
        &mut self,
        key: &str,
        page: &P,
        bootstrap: &SessionBootstrap,
    ) -> Result<SessionOrigin> {
        if let Some(session) = self.sessions.get(key) {
            log::debug!("Restoring cached session '{}'", key);
            bootstrap.restore(page, session)?;
            return Ok(SessionOrigin::Restored);
        }

        log::info!("Establishing session '{}'", key);
        bootstrap.establish(page)?;
        let session = LocaleSession {
            key: key.to_string(),
            zip: bootstrap.zip().to_string(),
            cookies: page.cookies()?,
            established_at: Utc::now(),
        };
        self.sessions.insert(key.to_string(), session);
        Ok(SessionOrigin::Established)
    }

    pub fn get(&self, key: &str) -> Option<&LocaleSession> {
        self.sessions.get(key)
    }

    /// Drop one cached session; returns whether it existed
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.sessions.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
