//! Command execution
//!
//! A [`Workspace`] owns the application state plus the reorder boards opened
//! so far. Moves only touch the local boards and the request cache; nothing
//! is sent until [`Workspace::save_all`] runs or a move passes `--save`.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use crate::app::AppState;
use crate::models::{Course, CourseModule, CourseStatus, ImageFile, Lesson, Visibility};
use crate::services::{
    guard, AccountDetails, CourseEditor, FlowError, LessonForm, LoginForm, ModuleForm, NewPasswordForm,
    ProfileDetails, RegistrationState, ReorderBoard, Route, RouteDecision, ServiceError,
};

use super::prompt::Prompt;
use super::render;
use super::{Command, CourseArgs, CourseCommand, LessonArgs, LessonCommand, ModuleCommand};

pub struct Workspace {
    state: AppState,
    prompt: Prompt,
    courses: Option<ReorderBoard<Course>>,
    modules: BTreeMap<i64, ReorderBoard<CourseModule>>,
    lessons: BTreeMap<i64, ReorderBoard<Lesson>>,
}

impl Workspace {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            prompt: Prompt::new(),
            courses: None,
            modules: BTreeMap::new(),
            lessons: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub(super) fn prompt(&mut self) -> &mut Prompt {
        &mut self.prompt
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        if let Some(route) = route_for(&command) {
            if !self.admit(&route).await? {
                return Ok(());
            }
        }

        let result = self.dispatch(command).await;
        if let Some(err) = result.as_ref().err().and_then(|e| e.downcast_ref::<ServiceError>()) {
            if self.state.session.expire_if_rejected(err).await? {
                self.drop_boards();
            }
        }
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, password } => self.login(email, password).await,
            Command::Logout => self.logout().await,
            Command::Whoami => self.whoami().await,
            Command::Register => self.register().await,
            Command::ForgotPassword => self.forgot_password().await,
            Command::Course(cmd) => self.course(cmd).await,
            Command::Module(cmd) => self.module(cmd).await,
            Command::Lesson(cmd) => self.lesson(cmd).await,
            Command::Students => {
                render::students(&self.state.students.list().await?);
                Ok(())
            }
            Command::Open { path } => self.open(&path).await,
            Command::Save => self.save_all().await,
            Command::Revert => self.revert_all().await,
            Command::Pending => {
                self.show_pending();
                Ok(())
            }
            Command::Shell => {
                self.state.notifier.info("Already in the shell");
                Ok(())
            }
        }
    }

    /// Print queued notices and turn the outcome into an exit code
    pub fn report(&self, result: Result<()>) -> ExitCode {
        let errors = render::notices(&self.state.notifier);
        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                if errors == 0 {
                    render::failure(&e);
                }
                ExitCode::FAILURE
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.courses.as_ref().is_some_and(ReorderBoard::has_pending)
            || self.modules.values().any(ReorderBoard::has_pending)
            || self.lessons.values().any(ReorderBoard::has_pending)
    }

    /// Send the pending batch of every open board
    pub async fn save_all(&mut self) -> Result<()> {
        if let Some(board) = self.courses.as_mut() {
            board.persist().await?;
        }
        for board in self.modules.values_mut() {
            board.persist().await?;
        }
        for board in self.lessons.values_mut() {
            board.persist().await?;
        }
        Ok(())
    }

    pub async fn revert_all(&mut self) -> Result<()> {
        let had_pending = self.has_pending();

        if let Some(board) = self.courses.as_mut() {
            board.rollback().await?;
        }
        for board in self.modules.values_mut() {
            board.rollback().await?;
        }
        for board in self.lessons.values_mut() {
            board.rollback().await?;
        }

        if had_pending {
            self.state.notifier.info("Unsaved order changes reverted");
        }
        Ok(())
    }

    pub fn show_pending(&self) {
        if !self.has_pending() {
            println!("Nothing to save.");
            return;
        }
        if let Some(board) = self.courses.as_ref().filter(|b| b.has_pending()) {
            render::pending("courses", &board.pending());
        }
        for (course_id, board) in self.modules.iter().filter(|(_, b)| b.has_pending()) {
            render::pending(&format!("modules of course {}", course_id), &board.pending());
        }
        for (module_id, board) in self.lessons.iter().filter(|(_, b)| b.has_pending()) {
            render::pending(&format!("lessons of module {}", module_id), &board.pending());
        }
    }

    fn drop_boards(&mut self) {
        self.courses = None;
        self.modules.clear();
        self.lessons.clear();
    }

    /// Guard a route; `Ok(false)` means the command is skipped
    async fn admit(&self, route: &Route) -> Result<bool> {
        match guard(&self.state.session.state().await, route) {
            RouteDecision::Render => Ok(true),
            RouteDecision::Redirect(Route::Login) => Err(self.state.notifier.fail(FlowError::NotAuthenticated).into()),
            RouteDecision::Redirect(target) => {
                self.state
                    .notifier
                    .info(format!("Already signed in, continue at {}", target));
                Ok(false)
            }
            RouteDecision::Loading => bail!("Session is still loading"),
        }
    }

    // Session

    async fn login(&mut self, email: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(password) => password,
            None => self.prompt.ask("Password").await?,
        };

        self.state.session.sign_in(&LoginForm { email, password }).await?;
        self.drop_boards();

        if let Some(user) = self.state.session.user().await {
            render::user(&user);
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.drop_boards();
        self.state.session.logout().await?;
        self.state.notifier.success("Signed out");
        Ok(())
    }

    async fn whoami(&self) -> Result<()> {
        let session = self.state.session.state().await;
        match (session.is_authenticated, session.user) {
            (false, _) => println!("Not signed in."),
            (true, Some(user)) => render::user(&user),
            (true, None) => println!("Signed in."),
        }
        Ok(())
    }

    /// Ask for a value; an empty answer cancels the whole flow
    async fn ask_required(&mut self, label: &str) -> Result<String> {
        let value = self.prompt.ask(label).await?;
        if value.is_empty() {
            bail!("Cancelled");
        }
        Ok(value)
    }

    async fn register(&mut self) -> Result<()> {
        let mut flow = self.state.registration();
        println!("Leave a field empty to cancel.");

        loop {
            let email = self.ask_required("Email").await?;
            let sent = flow.request_otp(&email).await;
            render::notices(&self.state.notifier);
            if sent.is_ok() {
                break;
            }
        }

        loop {
            let otp = self.ask_required("One-time password").await?;
            let verified = flow.verify_otp(&otp).await;
            render::notices(&self.state.notifier);
            if verified.is_ok() {
                break;
            }
        }

        let email = match flow.state() {
            RegistrationState::Verified { email } => email.clone(),
            _ => bail!(FlowError::EmailNotVerified),
        };

        while flow.state() != &RegistrationState::AccountCreated {
            let account = AccountDetails {
                first_name: self.ask_required("First name").await?,
                last_name: self.ask_required("Last name").await?,
                email: email.clone(),
                mobile: self.ask_required("Mobile").await?,
                password: self.ask_required("Password").await?,
            };
            let advanced = flow.next_step(account);
            render::notices(&self.state.notifier);
            if advanced.is_err() {
                continue;
            }

            loop {
                println!("Type `back` as the domain to edit your account details.");
                let domain = self.ask_required("Domain").await?;
                if domain == "back" {
                    flow.previous_step();
                    break;
                }
                let profile = ProfileDetails {
                    domain,
                    bio: self.ask_required("Bio").await?,
                    role: self.ask_required("Role").await?,
                };
                let created = flow.submit(profile).await;
                render::notices(&self.state.notifier);
                if created.is_ok() {
                    break;
                }
            }
        }

        self.drop_boards();
        if let Some(user) = self.state.session.user().await {
            render::user(&user);
        }
        Ok(())
    }

    async fn forgot_password(&mut self) -> Result<()> {
        let mut flow = self.state.password_reset();
        println!("Leave a field empty to cancel.");

        loop {
            let email = self.ask_required("Email").await?;
            let sent = flow.send_otp(&email).await;
            render::notices(&self.state.notifier);
            if sent.is_ok() {
                break;
            }
        }

        loop {
            let otp = self.ask_required("One-time password").await?;
            let verified = flow.verify_otp(&otp).await;
            render::notices(&self.state.notifier);
            if verified.is_ok() {
                break;
            }
        }

        loop {
            let form = NewPasswordForm {
                password: self.ask_required("New password").await?,
                repeat_password: self.ask_required("Repeat password").await?,
            };
            let reset = flow.reset(&form).await;
            render::notices(&self.state.notifier);
            if reset.is_ok() {
                break;
            }
        }

        println!("Sign in with your new password.");
        Ok(())
    }

    // Courses

    async fn course(&mut self, cmd: CourseCommand) -> Result<()> {
        match cmd {
            CourseCommand::List => render::courses(&self.state.courses.list().await?),
            CourseCommand::Show { id } => {
                let course = self.state.courses.get(id).await?;
                render::course(&course, &self.state.config.storage.image_base_url);
            }
            CourseCommand::Create(fields) => {
                self.fail_if_unsaved(self.courses.as_ref().is_some_and(ReorderBoard::has_pending), "course")?;
                let mut editor = self.state.courses.editor(None).await?;
                self.fill_course(&mut editor, fields).await?;
                let course = self.state.courses.submit(&mut editor).await?;
                self.courses = None;
                render::course(&course, &self.state.config.storage.image_base_url);
            }
            CourseCommand::Edit { id, fields } => {
                self.fail_if_unsaved(self.courses.as_ref().is_some_and(ReorderBoard::has_pending), "course")?;
                let mut editor = self.state.courses.editor(Some(id)).await?;
                self.fill_course(&mut editor, fields).await?;
                let course = self.state.courses.submit(&mut editor).await?;
                self.courses = None;
                render::course(&course, &self.state.config.storage.image_base_url);
            }
            CourseCommand::Delete { id, yes } => {
                self.fail_if_unsaved(self.courses.as_ref().is_some_and(ReorderBoard::has_pending), "course")?;
                if !yes && !self.prompt.confirm(&format!("Delete course {} with all its modules?", id)).await? {
                    return Ok(());
                }
                self.state.courses.delete(id).await?;
                self.courses = None;
                if let Some(board) = self.modules.remove(&id) {
                    for module in board.items() {
                        self.lessons.remove(&module.id);
                    }
                }
            }
            CourseCommand::Move { active, over, save } => {
                if self.courses.is_none() {
                    self.courses = Some(self.state.courses.board().await?);
                }
                let board = self.courses.as_mut().ok_or_else(|| anyhow!("Course list unavailable"))?;
                if !board.move_item(active, over).await? {
                    self.state.notifier.info("Nothing moved");
                }
                if save {
                    board.persist().await?;
                }
                render::courses(board.items());
            }
        }
        Ok(())
    }

    /// Copy the given fields into the editor, walking both form steps
    async fn fill_course(&mut self, editor: &mut CourseEditor, fields: CourseArgs) -> Result<()> {
        let draft = &mut editor.draft;
        if let Some(title) = fields.title {
            draft.title = title;
        }
        if let Some(description) = fields.description {
            draft.description = description;
        }
        if let Some(price) = fields.price {
            draft.price = price;
        }
        if let Some(duration) = fields.duration {
            draft.duration = duration;
        }
        if let Some(published) = fields.published {
            draft.status = CourseStatus::from(published);
        }

        if let Some(path) = fields.image {
            let image = read_image(&path).await?;
            editor
                .set_image(image)
                .map_err(|e| self.state.notifier.fail(e))?;
        }

        editor.next_step();

        let draft = &mut editor.draft;
        if let Some(highlights) = fields.highlights {
            draft.highlights = highlights;
        }
        if let Some(outcomes) = fields.outcomes {
            draft.outcomes = outcomes;
        }
        if let Some(prerequisites) = fields.prerequisites {
            draft.prerequisites = prerequisites;
        }
        Ok(())
    }

    fn fail_if_unsaved(&self, pending: bool, what: &str) -> Result<()> {
        if pending {
            bail!("Save or revert the pending {} order first", what);
        }
        Ok(())
    }

    // Modules

    async fn module(&mut self, cmd: ModuleCommand) -> Result<()> {
        match cmd {
            ModuleCommand::List { course_id } => render::modules(&self.state.modules.list(course_id).await?),
            ModuleCommand::Add { course_id, title } => {
                self.fail_if_unsaved(self.modules_pending(course_id), "module")?;
                self.state.modules.create(course_id, &ModuleForm { title }).await?;
                self.modules.remove(&course_id);
                render::modules(&self.state.modules.list(course_id).await?);
            }
            ModuleCommand::Rename {
                course_id,
                module_id,
                title,
            } => {
                self.fail_if_unsaved(self.modules_pending(course_id), "module")?;
                self.state
                    .modules
                    .update(course_id, module_id, &ModuleForm { title })
                    .await?;
                self.modules.remove(&course_id);
            }
            ModuleCommand::Delete {
                course_id,
                module_id,
                yes,
            } => {
                self.fail_if_unsaved(self.modules_pending(course_id), "module")?;
                if !yes && !self.prompt.confirm(&format!("Delete module {} and its lessons?", module_id)).await? {
                    return Ok(());
                }
                self.state.modules.delete(course_id, module_id).await?;
                self.modules.remove(&course_id);
                self.lessons.remove(&module_id);
            }
            ModuleCommand::Move { course_id, active, over, save } => {
                if !self.modules.contains_key(&course_id) {
                    let board = self.state.modules.board(course_id).await?;
                    self.modules.insert(course_id, board);
                }
                let board = self
                    .modules
                    .get_mut(&course_id)
                    .ok_or_else(|| anyhow!("Modules of course {} unavailable", course_id))?;
                if !board.move_item(active, over).await? {
                    self.state.notifier.info("Nothing moved");
                }
                if save {
                    board.persist().await?;
                }
                render::modules(board.items());
            }
        }
        Ok(())
    }

    fn modules_pending(&self, course_id: i64) -> bool {
        self.modules.get(&course_id).is_some_and(ReorderBoard::has_pending)
    }

    // Lessons

    async fn lesson(&mut self, cmd: LessonCommand) -> Result<()> {
        match cmd {
            LessonCommand::List { module_id } => render::lessons(&self.state.lessons.list(module_id).await?),
            LessonCommand::Show { module_id, lesson_id } => {
                let lesson = self.find_lesson(module_id, lesson_id).await?;
                render::lesson(&lesson);
            }
            LessonCommand::Add { module_id, fields } => {
                self.fail_if_unsaved(self.lessons_pending(module_id), "lesson")?;
                let mut form = LessonForm::default();
                fields.apply_to(&mut form);
                let lesson = self.state.lessons.create(module_id, &form).await?;
                self.lessons.remove(&module_id);
                render::lesson(&lesson);
            }
            LessonCommand::Edit {
                module_id,
                lesson_id,
                fields,
            } => {
                self.fail_if_unsaved(self.lessons_pending(module_id), "lesson")?;
                let mut form = LessonForm::from_lesson(&self.find_lesson(module_id, lesson_id).await?);
                fields.apply_to(&mut form);
                let lesson = self.state.lessons.update(module_id, lesson_id, &form).await?;
                self.lessons.remove(&module_id);
                render::lesson(&lesson);
            }
            LessonCommand::Delete {
                module_id,
                lesson_id,
                yes,
            } => {
                self.fail_if_unsaved(self.lessons_pending(module_id), "lesson")?;
                if !yes && !self.prompt.confirm(&format!("Delete lesson {}?", lesson_id)).await? {
                    return Ok(());
                }
                self.state.lessons.delete(module_id, lesson_id).await?;
                self.lessons.remove(&module_id);
            }
            LessonCommand::Move { module_id, active, over, save } => {
                if !self.lessons.contains_key(&module_id) {
                    let board = self.state.lessons.board(module_id).await?;
                    self.lessons.insert(module_id, board);
                }
                let board = self
                    .lessons
                    .get_mut(&module_id)
                    .ok_or_else(|| anyhow!("Lessons of module {} unavailable", module_id))?;
                if !board.move_item(active, over).await? {
                    self.state.notifier.info("Nothing moved");
                }
                if save {
                    board.persist().await?;
                }
                render::lessons(board.items());
            }
        }
        Ok(())
    }

    fn lessons_pending(&self, module_id: i64) -> bool {
        self.lessons.get(&module_id).is_some_and(ReorderBoard::has_pending)
    }

    async fn find_lesson(&self, module_id: i64, lesson_id: i64) -> Result<Lesson> {
        self.state
            .lessons
            .get(module_id, lesson_id)
            .await?
            .ok_or_else(|| anyhow!("Lesson {} not found in module {}", lesson_id, module_id))
    }

    // Routes

    async fn open(&mut self, path: &str) -> Result<()> {
        let route = match path.parse::<Route>() {
            Ok(route) => route,
            Err(never) => match never {},
        };

        match guard(&self.state.session.state().await, &route) {
            RouteDecision::Loading => {
                println!("Loading…");
                Ok(())
            }
            RouteDecision::Redirect(target) => {
                self.state
                    .notifier
                    .info(format!("{} redirects to {}", route, target));
                self.show_route(&target).await
            }
            RouteDecision::Render => self.show_route(&route).await,
        }
    }

    async fn show_route(&mut self, route: &Route) -> Result<()> {
        match route {
            Route::Home => println!("Sign in with `login --email <email>` or create an account with `register`."),
            Route::Login => println!("Sign in with `login --email <email>`."),
            Route::Register => println!("Create an account with `register`."),
            Route::ForgotPassword => println!("Reset your password with `forgot-password`."),
            Route::Dashboard => {
                if let Some(user) = self.state.session.user().await {
                    render::user(&user);
                }
                let courses = self.state.courses.list().await?;
                let students = self.state.students.list().await?;
                println!("{} courses, {} students", courses.len(), students.len());
            }
            Route::Courses => render::courses(&self.state.courses.list().await?),
            Route::CourseNew => println!("Create a course with `course create --title … --image <file>`."),
            Route::CourseEdit { course_id } => {
                let course = self.state.courses.get(*course_id).await?;
                render::course(&course, &self.state.config.storage.image_base_url);
            }
            Route::Modules { course_id } => render::modules(&self.state.modules.list(*course_id).await?),
            Route::Lessons { module_id, .. } => render::lessons(&self.state.lessons.list(*module_id).await?),
            Route::Lesson {
                module_id, lesson_id, ..
            } => render::lesson(&self.find_lesson(*module_id, *lesson_id).await?),
            Route::Students => render::students(&self.state.students.list().await?),
            Route::NotFound => println!("404: page not found."),
        }
        Ok(())
    }
}

impl LessonArgs {
    fn apply_to(self, form: &mut LessonForm) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(kind) = self.kind {
            form.kind = kind;
        }
        if let Some(visibility) = self.visibility {
            form.visibility = visibility;
            if visibility == Visibility::Lock && self.url.is_none() {
                form.url.clear();
            }
        }
        if let Some(url) = self.url {
            form.url = url;
        }
    }
}

/// Route a command renders, or `None` when it is always allowed
fn route_for(command: &Command) -> Option<Route> {
    match command {
        Command::Login { .. } => Some(Route::Login),
        Command::Register => Some(Route::Register),
        Command::ForgotPassword => Some(Route::ForgotPassword),
        Command::Course(CourseCommand::Create(_)) => Some(Route::CourseNew),
        Command::Course(CourseCommand::Show { id } | CourseCommand::Edit { id, .. }) => {
            Some(Route::CourseEdit { course_id: *id })
        }
        Command::Course(_) => Some(Route::Courses),
        Command::Module(
            ModuleCommand::List { course_id }
            | ModuleCommand::Add { course_id, .. }
            | ModuleCommand::Rename { course_id, .. }
            | ModuleCommand::Delete { course_id, .. }
            | ModuleCommand::Move { course_id, .. },
        ) => Some(Route::Modules { course_id: *course_id }),
        Command::Lesson(_) | Command::Save => Some(Route::Dashboard),
        Command::Students => Some(Route::Students),
        Command::Logout
        | Command::Whoami
        | Command::Open { .. }
        | Command::Revert
        | Command::Pending
        | Command::Shell => None,
    }
}

async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageFile::new(name, content_type_for(path), bytes))
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path.extension().map(|e| e.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
