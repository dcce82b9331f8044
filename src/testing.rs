//! Recording stand-ins for every collaborator, for unit tests only.

use crate::args::Args;
use crate::config::Config;
use crate::context::{Asset, Context, Editor, Executor, Hosting, LocalRepo, NewRelease, Project, Release};
use crate::dispatch;
use crate::registry::Registry;
use anyhow::{anyhow, bail, Result};
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct ExecState {
    calls: RefCell<Vec<(String, Vec<String>)>>,
    status: Cell<i32>,
    fail_launch: Cell<bool>,
}

#[derive(Clone, Default)]
pub struct RecordingExecutor(Rc<ExecState>);

impl RecordingExecutor {
    pub fn set_status(&self, status: i32) {
        self.0.status.set(status);
    }

    pub fn fail_launch(&self) {
        self.0.fail_launch.set(true);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.0.calls.borrow().iter().map(|(_, a)| a.clone()).collect()
    }

    pub fn programs(&self) -> Vec<String> {
        self.0.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
    }
}

impl Executor for RecordingExecutor {
    fn exec(&self, program: &str, args: &[String]) -> Result<i32> {
        if self.0.fail_launch.get() {
            bail!("Failed to run {}: No such file or directory", program);
        }
        self.0
            .calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        Ok(self.0.status.get())
    }
}

pub struct FakeRepo {
    pub main: Option<Project>,
    pub current: Option<Project>,
    pub branch: Option<String>,
    pub comment_char: String,
}

impl Default for FakeRepo {
    fn default() -> Self {
        Self {
            main: Some(project("octocat", "hello")),
            current: None,
            branch: Some("main".to_string()),
            comment_char: "#".to_string(),
        }
    }
}

impl LocalRepo for FakeRepo {
    fn main_project(&self) -> Result<Project> {
        self.main
            .clone()
            .ok_or_else(|| anyhow!("Aborted: could not find any git remote pointing to a GitHub repository"))
    }

    fn current_project(&self) -> Result<Project> {
        match &self.current {
            Some(p) => Ok(p.clone()),
            None => self.main_project(),
        }
    }

    fn current_branch(&self) -> Result<String> {
        self.branch
            .clone()
            .ok_or_else(|| anyhow!("Aborted: not currently on any branch."))
    }

    fn comment_char(&self) -> String {
        self.comment_char.clone()
    }
}

pub fn project(owner: &str, name: &str) -> Project {
    Project {
        host: "github.com".into(),
        owner: owner.into(),
        name: name.into(),
    }
}

#[derive(Default)]
pub struct HostingState {
    pub calls: RefCell<Vec<String>>,
    pub releases: RefCell<Vec<Release>>,
    pub created: RefCell<Vec<NewRelease>>,
    pub uploads: RefCell<Vec<(String, String)>>,
    pub fail_create: Cell<bool>,
    pub fail_upload: Cell<bool>,
    pub user: RefCell<String>,
}

#[derive(Clone, Default)]
pub struct FakeHosting(pub Rc<HostingState>);

impl FakeHosting {
    pub fn calls(&self) -> Vec<String> {
        self.0.calls.borrow().clone()
    }

    pub fn add_release(&self, release: Release) {
        self.0.releases.borrow_mut().push(release);
    }

    fn record(&self, call: String) {
        self.0.calls.borrow_mut().push(call);
    }
}

impl Hosting for FakeHosting {
    fn fetch_releases(&self, project: &Project) -> Result<Vec<Release>> {
        self.record(format!("fetch_releases {}", project));
        Ok(self.0.releases.borrow().clone())
    }

    fn fetch_release(&self, project: &Project, tag: &str) -> Result<Release> {
        self.record(format!("fetch_release {} {}", project, tag));
        self.0
            .releases
            .borrow()
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned()
            .ok_or_else(|| anyhow!("Unable to find release with tag name `{}'", tag))
    }

    fn create_release(&self, project: &Project, params: &NewRelease) -> Result<Release> {
        self.record(format!("create_release {} {}", project, params.tag_name));
        if self.0.fail_create.get() {
            bail!("Error creating release: Validation Failed (HTTP 422)");
        }
        self.0.created.borrow_mut().push(params.clone());
        Ok(Release {
            id: 42,
            tag_name: params.tag_name.clone(),
            name: params.name.clone(),
            body: params.body.clone(),
            draft: params.draft,
            prerelease: params.prerelease,
            html_url: format!("https://github.com/{}/releases/tag/{}", project, params.tag_name),
            ..Release::default()
        })
    }

    fn upload_asset(
        &self,
        project: &Project,
        release: &Release,
        path: &Path,
        label: &str,
    ) -> Result<Asset> {
        let file = path.display().to_string();
        self.record(format!("upload_asset {} {} {}", project.host, release.id, file));
        if self.0.fail_upload.get() {
            bail!("Error uploading release asset: HTTP 500");
        }
        self.0
            .uploads
            .borrow_mut()
            .push((file.clone(), label.to_string()));
        Ok(Asset {
            name: file,
            label: label.to_string(),
            browser_download_url: String::new(),
        })
    }

    fn current_user(&self, host: &str) -> Result<String> {
        self.record(format!("current_user {}", host));
        let user = self.0.user.borrow().clone();
        if user.is_empty() {
            bail!("not logged in");
        }
        Ok(user)
    }
}

#[derive(Default)]
pub struct EditorState {
    pub reply: RefCell<Option<(String, String)>>,
    pub templates: RefCell<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct ScriptedEditor(pub Rc<EditorState>);

impl ScriptedEditor {
    pub fn reply(&self, title: &str, body: &str) {
        *self.0.reply.borrow_mut() = Some((title.to_string(), body.to_string()));
    }

    pub fn templates(&self) -> Vec<String> {
        self.0.templates.borrow().clone()
    }
}

impl Editor for ScriptedEditor {
    fn edit_title_and_body(&self, _comment_char: &str, template: &str) -> Result<(String, String)> {
        self.0.templates.borrow_mut().push(template.to_string());
        self.0
            .reply
            .borrow()
            .clone()
            .ok_or_else(|| anyhow!("editor exited with status 1"))
    }
}

/// A [`Context`] wired to fakes, with handles kept for assertions.
pub struct Harness {
    pub ctx: Context,
    pub exec: RecordingExecutor,
    pub hosting: FakeHosting,
    pub editor: ScriptedEditor,
    pub out: SharedBuf,
    pub err: SharedBuf,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_repo(FakeRepo::default())
    }

    pub fn with_repo(repo: FakeRepo) -> Self {
        let exec = RecordingExecutor::default();
        let hosting = FakeHosting::default();
        let editor = ScriptedEditor::default();
        let out = SharedBuf::default();
        let err = SharedBuf::default();

        let ctx = Context {
            config: Config::default(),
            git: Box::new(exec.clone()),
            repo: Box::new(repo),
            hosting: Box::new(hosting.clone()),
            editor: Box::new(editor.clone()),
            out: Box::new(out.clone()),
            err: Box::new(err.clone()),
        };

        Self {
            ctx,
            exec,
            hosting,
            editor,
            out,
            err,
        }
    }

    pub fn dispatch(&mut self, registry: &Registry, tokens: &[&str]) -> i32 {
        let mut args = Args::new(tokens.iter().copied());
        dispatch::dispatch(registry, &mut args, &mut self.ctx)
    }

    pub fn dispatch_noop(&mut self, registry: &Registry, tokens: &[&str]) -> i32 {
        let mut args = Args::new(tokens.iter().copied());
        args.set_noop();
        dispatch::dispatch(registry, &mut args, &mut self.ctx)
    }

    /// Dispatch against the shipped command set.
    pub fn run(&mut self, tokens: &[&str]) -> i32 {
        let registry = Registry::builtin().expect("builtin registry");
        self.dispatch(&registry, tokens)
    }

    pub fn run_noop(&mut self, tokens: &[&str]) -> i32 {
        let registry = Registry::builtin().expect("builtin registry");
        self.dispatch_noop(&registry, tokens)
    }
}
