use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::PollConfig,
    error::{FlyerError, Result},
    models::{GenerationRequest, ImageRef, ResultContext, Slot},
    service::GenerationService,
    session::{
        guard::{Action, ActionGuard},
        state::{ActiveTab, Notice, Page, PreviewSelection, SessionState},
        view::ViewState,
    },
    workflow::{editor, submission},
};

pub struct Session<S: ?Sized> {
    id: Uuid,
    service: Arc<S>,
    poll: PollConfig,
    cancel: CancellationToken,
    state: Arc<Mutex<SessionState>>,
}

impl<S: ?Sized> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            service: Arc::clone(&self.service),
            poll: self.poll.clone(),
            cancel: self.cancel.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: GenerationService + ?Sized> Session<S> {
    pub fn new(service: Arc<S>, poll: PollConfig) -> Self {
        let id = Uuid::new_v4();
        log::info!("Session {} started", id);
        Self {
            id,
            service,
            poll,
            cancel: CancellationToken::new(),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn context(&self) -> ResultContext {
        self.lock().context.clone()
    }

    pub fn view(&self) -> ViewState {
        ViewState::render(&self.lock())
    }

    pub fn set_active_tab(&self, tab: ActiveTab) {
        let _ = self.commit(|state| state.active_tab = tab);
    }

    pub fn dismiss_notice(&self) {
        let _ = self.commit(|state| state.notice = None);
    }

    /// Back arrow: Design returns to the gallery, the gallery to the form.
    /// Leaving a page drops its preview and edit draft.
    pub fn navigate_back(&self) {
        let _ = self.commit(|state| {
            state.page = match state.page {
                Page::Design(_) => Page::Gallery,
                Page::Gallery | Page::Generation => Page::Generation,
            };
            state.selection = PreviewSelection::Idle;
            state.edit_prompt.clear();
        });
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<ResultContext> {
        let result = self.generate_inner(&request).await;
        self.report(Action::Generate, result)
    }

    async fn generate_inner(&self, request: &GenerationRequest) -> Result<ResultContext> {
        let (_guard, ()) = self.begin(Action::Generate, |_| request.validate())?;

        let images =
            submission::submit_and_wait(self.service.as_ref(), request, &self.poll, &self.cancel)
                .await?;
        let next = ResultContext::from_completed(request, &images);

        self.commit(|state| {
            state.context = next.clone();
            state.selection = PreviewSelection::Idle;
            state.page = Page::Gallery;
        })?;
        log::info!("Session {} gallery ready with {} design(s)", self.id, images.len());
        Ok(next)
    }

    pub fn select_slot(&self, slot: Slot) -> Result<ImageRef> {
        let result = self.commit_with(|state| {
            if let Some(active) = state.in_flight {
                return Err(FlyerError::Busy(active.as_str()));
            }
            let selection = PreviewSelection::select(&state.context, slot)?;
            let image = selection.image().cloned();
            state.selection = selection;
            image.ok_or_else(|| FlyerError::NotAllowed(format!("Slot {} has no image", slot)))
        });
        self.report(Action::Edit, result)
    }

    pub fn close_preview(&self) {
        let _ = self.commit(|state| state.selection = PreviewSelection::Idle);
    }

    pub fn set_edit_prompt(&self, prompt: &str) {
        let _ = self.commit(|state| state.edit_prompt = prompt.to_string());
    }

    /// Edits the selected image with the drafted prompt. Only that slot
    /// changes, and the draft is cleared on success.
    pub async fn apply_edit(&self) -> Result<ResultContext> {
        let result = self.apply_edit_inner().await;
        self.report(Action::Edit, result)
    }

    async fn apply_edit_inner(&self) -> Result<ResultContext> {
        let (_guard, (slot, ctx, prompt)) = self.begin(Action::Edit, |state| {
            let slot = state.selection.slot().ok_or_else(|| {
                FlyerError::NotAllowed("Select an image before editing".into())
            })?;
            if state.edit_prompt.trim().is_empty() {
                return Err(FlyerError::Validation("Edit prompt is empty".into()));
            }
            Ok((slot, state.context.clone(), state.edit_prompt.clone()))
        })?;

        let next = self
            .cancellable(editor::apply_edit(self.service.as_ref(), &ctx, slot, &prompt))
            .await?;

        self.commit(|state| {
            state.context = next.clone();
            state.selection = PreviewSelection::Idle;
            state.edit_prompt.clear();
        })?;
        Ok(next)
    }

    pub async fn regenerate(&self) -> Result<ResultContext> {
        let result = self.regenerate_inner().await;
        self.report(Action::Regenerate, result)
    }

    async fn regenerate_inner(&self) -> Result<ResultContext> {
        let (_guard, ctx) = self.begin(Action::Regenerate, |state| {
            if state.selection.is_visible() {
                return Err(FlyerError::NotAllowed(
                    "Close the preview before regenerating".into(),
                ));
            }
            if state.context.is_empty() {
                return Err(FlyerError::NotAllowed("Nothing to regenerate yet".into()));
            }
            Ok(state.context.clone())
        })?;

        let next = self
            .cancellable(editor::regenerate(self.service.as_ref(), &ctx))
            .await?;

        self.commit(|state| state.context = next.clone())?;
        Ok(next)
    }

    pub fn select_design(&self) -> Option<ImageRef> {
        self.commit_with(|state| {
            let image = state.selection.image().cloned();
            if let Some(image) = &image {
                state.page = Page::Design(image.clone());
            }
            Ok(image)
        })
        .ok()
        .flatten()
    }

    /// Ends the session. Pending polls stop and late replies are dropped.
    pub fn teardown(&self) {
        let _state = self.lock();
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            log::info!("Session {} torn down", self.id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Check and reservation happen under one lock.
    fn begin<T>(
        &self,
        action: Action,
        check: impl FnOnce(&SessionState) -> Result<T>,
    ) -> Result<(ActionGuard, T)> {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            return Err(FlyerError::Cancelled);
        }
        if let Some(active) = state.in_flight {
            log::warn!(
                "Rejected {} while {} is in flight",
                action.as_str(),
                active.as_str()
            );
            return Err(FlyerError::Busy(active.as_str()));
        }
        let value = check(&state)?;
        state.notice = None;
        let guard = ActionGuard::reserve(&self.state, &mut state, action);
        Ok((guard, value))
    }

    fn commit<T>(&self, update: impl FnOnce(&mut SessionState) -> T) -> Result<T> {
        self.commit_with(|state| Ok(update(state)))
    }

    fn commit_with<T>(&self, update: impl FnOnce(&mut SessionState) -> Result<T>) -> Result<T> {
        let mut state = self.lock();
        if self.cancel.is_cancelled() {
            log::debug!("Session {} is gone, discarding update", self.id);
            return Err(FlyerError::Cancelled);
        }
        update(&mut state)
    }

    async fn cancellable<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FlyerError::Cancelled),
            result = work => result,
        }
    }

    fn report<T>(&self, action: Action, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if let Some(notice) = Notice::for_error(action, err) {
                log::warn!("{} failed: {}", action.as_str(), err);
                let _ = self.commit(|state| state.notice = Some(notice));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImagesPayload;
    use crate::service::mock::{completed, many, pending, ScriptedService};
    use std::time::Duration;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Campus hackathon")
            .with_model("bold")
            .with_aspect_ratio("9:16")
    }

    fn fast() -> PollConfig {
        PollConfig::new().with_interval(Duration::from_millis(5))
    }

    fn img(s: &str) -> ImageRef {
        ImageRef::parse(s).unwrap()
    }

    /// Session whose first `generate` completes immediately with a..d.
    async fn gallery(service: ScriptedService) -> (Session<ScriptedService>, Arc<ScriptedService>) {
        let service = Arc::new(service.on_submit(completed(&["a", "b", "c", "d"])));
        let session = Session::new(Arc::clone(&service), fast());
        session.generate(request()).await.unwrap();
        (session, service)
    }

    #[tokio::test]
    async fn test_generate_polls_then_opens_gallery() {
        let service = Arc::new(
            ScriptedService::new()
                .on_submit(pending("T1"))
                .on_status(pending("T1"))
                .on_status(completed(&["a", "b", "c", "d"])),
        );
        let session = Session::new(Arc::clone(&service), fast());

        let ctx = session.generate(request()).await.unwrap();

        assert_eq!(ctx.img3, Some(img("c")));
        let state = session.snapshot();
        assert_eq!(state.page, Page::Gallery);
        assert_eq!(state.context, ctx);
        assert_eq!(state.in_flight, None);
        assert_eq!(state.notice, None);
        assert_eq!(ScriptedService::calls(&service.status_calls), 2);
    }

    #[tokio::test]
    async fn test_generate_validation_sets_notice_without_calls() {
        let service = Arc::new(ScriptedService::new());
        let session = Session::new(Arc::clone(&service), fast());

        let err = session
            .generate(GenerationRequest::new("only a prompt"))
            .await
            .unwrap_err();

        assert!(matches!(err, FlyerError::Validation(_)));
        assert_eq!(ScriptedService::calls(&service.submit_calls), 0);
        let state = session.snapshot();
        assert_eq!(state.notice, Some(Notice::MissingGenerationInput));
        assert_eq!(state.page, Page::Generation);
        assert!(state.context.is_empty());
    }

    #[tokio::test]
    async fn test_generate_quota_notice() {
        let service = Arc::new(
            ScriptedService::new().on_submit(Err(FlyerError::Quota("limit".into()))),
        );
        let session = Session::new(service, fast());

        assert!(session.generate(request()).await.unwrap_err().is_quota());
        assert_eq!(session.snapshot().notice, Some(Notice::LimitReached));
    }

    #[tokio::test]
    async fn test_teardown_during_poll_prevents_mutation() {
        let service = Arc::new(
            ScriptedService::new()
                .on_submit(pending("T1"))
                .on_status(pending("T1"))
                .on_status(completed(&["a", "b", "c", "d"])),
        );
        let session = Session::new(
            Arc::clone(&service),
            PollConfig::new().with_interval(Duration::from_millis(200)),
        );

        let worker = session.clone();
        let handle = tokio::spawn(async move { worker.generate(request()).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        session.teardown();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(FlyerError::Cancelled));

        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = session.snapshot();
        assert!(state.context.is_empty());
        assert_eq!(state.page, Page::Generation);
        assert_eq!(state.notice, None);
        assert_eq!(ScriptedService::calls(&service.status_calls), 1);
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn test_late_regenerate_reply_is_discarded() {
        let (session, _service) = gallery(
            ScriptedService::new()
                .with_latency(Duration::from_millis(100))
                .on_regenerate(many(&["w", "x", "y", "z"])),
        )
        .await;
        let before = session.context();

        let worker = session.clone();
        let handle = tokio::spawn(async move { worker.regenerate().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.teardown();

        assert_eq!(handle.await.unwrap(), Err(FlyerError::Cancelled));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(session.context(), before);
    }

    #[tokio::test]
    async fn test_edit_selected_slot() {
        let (session, service) =
            gallery(ScriptedService::new().on_edit(Ok(ImagesPayload::One("x".into())))).await;

        assert_eq!(session.select_slot(Slot::Img2).unwrap(), img("b"));
        assert!(session.snapshot().selection.is_visible());

        session.set_edit_prompt("new prompt");
        let ctx = session.apply_edit().await.unwrap();

        assert_eq!(ctx.img1, Some(img("a")));
        assert_eq!(ctx.img2, Some(img("x")));
        assert_eq!(ctx.img3, Some(img("c")));
        assert_eq!(ctx.img4, Some(img("d")));
        assert_eq!(ctx.prompt, "new prompt");
        let state = session.snapshot();
        assert_eq!(state.selection, PreviewSelection::Idle);
        assert_eq!(state.edit_prompt, "");
        assert_eq!(session.view().edit_prompt, "");
        assert_eq!(ScriptedService::calls(&service.edit_calls), 1);
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_draft_and_preview() {
        let (session, _service) =
            gallery(ScriptedService::new().on_edit(Err(FlyerError::service("down")))).await;
        let before = session.context();

        session.select_slot(Slot::Img3).unwrap();
        session.set_edit_prompt("add confetti");
        assert!(session.apply_edit().await.is_err());

        let state = session.snapshot();
        assert_eq!(state.context, before);
        assert_eq!(state.edit_prompt, "add confetti");
        assert_eq!(session.view().edit_prompt, "add confetti");
        assert_eq!(state.selection.slot(), Some(Slot::Img3));
        assert!(matches!(state.notice, Some(Notice::ServiceFailure(_))));
    }

    #[tokio::test]
    async fn test_edit_requires_selection_and_prompt() {
        let (session, service) = gallery(ScriptedService::new()).await;

        session.set_edit_prompt("p");
        let err = session.apply_edit().await.unwrap_err();
        assert!(matches!(err, FlyerError::NotAllowed(_)));

        session.select_slot(Slot::Img1).unwrap();
        session.set_edit_prompt("  ");
        let err = session.apply_edit().await.unwrap_err();
        assert!(matches!(err, FlyerError::Validation(_)));
        assert_eq!(session.snapshot().notice, Some(Notice::MissingEditPrompt));
        assert!(session.snapshot().selection.is_visible());
        assert_eq!(ScriptedService::calls(&service.edit_calls), 0);
    }

    #[tokio::test]
    async fn test_regenerate_refused_while_preview_open() {
        let (session, service) = gallery(ScriptedService::new()).await;
        session.select_slot(Slot::Img3).unwrap();

        let err = session.regenerate().await.unwrap_err();
        assert!(matches!(err, FlyerError::NotAllowed(_)));
        assert_eq!(ScriptedService::calls(&service.regenerate_calls), 0);

        session.close_preview();
        assert!(!session.snapshot().selection.is_visible());
    }

    #[tokio::test]
    async fn test_regenerate_replaces_slots() {
        let (session, _service) =
            gallery(ScriptedService::new().on_regenerate(many(&["w", "x", "y", "z"]))).await;

        session.regenerate().await.unwrap();

        let ctx = session.context();
        assert_eq!(ctx.img1, Some(img("w")));
        assert_eq!(ctx.img2, Some(img("x")));
        assert_eq!(ctx.img3, Some(img("y")));
        assert_eq!(ctx.img4, Some(img("z")));
    }

    #[tokio::test]
    async fn test_regenerate_failure_leaves_context_unchanged() {
        let (session, _service) = gallery(
            ScriptedService::new().on_regenerate(Err(FlyerError::service("down"))),
        )
        .await;
        let before = session.context();

        assert!(session.regenerate().await.is_err());

        assert_eq!(session.context(), before);
        assert!(matches!(
            session.snapshot().notice,
            Some(Notice::ServiceFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_regenerate_runs_once() {
        let (session, service) = gallery(
            ScriptedService::new()
                .with_latency(Duration::from_millis(30))
                .on_regenerate(many(&["w", "x", "y", "z"]))
                .on_regenerate(many(&["1", "2", "3", "4"])),
        )
        .await;

        let (first, second) = futures::join!(session.regenerate(), session.regenerate());

        assert!(first.is_ok());
        assert_eq!(second, Err(FlyerError::Busy("regenerate")));
        assert_eq!(ScriptedService::calls(&service.regenerate_calls), 1);
        assert_eq!(session.context().img1, Some(img("w")));
        assert_eq!(session.snapshot().in_flight, None);
    }

    #[tokio::test]
    async fn test_edit_and_regenerate_exclude_each_other() {
        let (session, service) = gallery(
            ScriptedService::new()
                .with_latency(Duration::from_millis(30))
                .on_edit(Ok(ImagesPayload::One("x".into())))
                .on_regenerate(many(&["w", "x", "y", "z"])),
        )
        .await;
        session.select_slot(Slot::Img1).unwrap();
        session.set_edit_prompt("p");

        let edit = session.apply_edit();
        let regen = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            session.regenerate().await
        };
        let (edited, regenerated) = futures::join!(edit, regen);

        assert!(edited.is_ok());
        assert_eq!(regenerated, Err(FlyerError::Busy("edit")));
        assert_eq!(ScriptedService::calls(&service.edit_calls), 1);
        assert_eq!(ScriptedService::calls(&service.regenerate_calls), 0);
    }

    #[tokio::test]
    async fn test_select_design_hands_off_preview() {
        let (session, _service) = gallery(ScriptedService::new()).await;
        assert_eq!(session.select_design(), None);

        session.select_slot(Slot::Img4).unwrap();
        assert_eq!(session.select_design(), Some(img("d")));
        assert_eq!(session.snapshot().page, Page::Design(img("d")));

        session.navigate_back();
        assert_eq!(session.snapshot().page, Page::Gallery);
    }

    #[tokio::test]
    async fn test_navigate_back_closes_preview() {
        let service = Arc::new(
            ScriptedService::new()
                .on_submit(completed(&["a", "b", "c", "d"]))
                .on_submit(completed(&["e", "f", "g", "h"])),
        );
        let session = Session::new(Arc::clone(&service), fast());
        session.generate(request()).await.unwrap();

        session.select_slot(Slot::Img2).unwrap();
        session.set_edit_prompt("brighter");
        assert_eq!(session.select_design(), Some(img("b")));
        session.navigate_back();

        let view = session.view();
        assert_eq!(view.page, "gallery");
        assert_eq!(view.preview, None);
        assert_eq!(view.edit_prompt, "");
        assert!(view.regenerate_button.is_enabled());

        session.select_slot(Slot::Img1).unwrap();
        session.navigate_back();
        let state = session.snapshot();
        assert_eq!(state.page, Page::Generation);
        assert_eq!(state.selection, PreviewSelection::Idle);

        session.generate(request()).await.unwrap();
        assert_eq!(ScriptedService::calls(&service.submit_calls), 2);
        assert_eq!(session.context().img1, Some(img("e")));
    }

    #[tokio::test]
    async fn test_tabs_and_notice_dismissal() {
        let service = Arc::new(ScriptedService::new());
        let session = Session::new(service, fast());
        assert_eq!(session.snapshot().active_tab, ActiveTab::Creation);

        session.set_active_tab(ActiveTab::Examples);
        assert_eq!(session.snapshot().active_tab, ActiveTab::Examples);

        let _ = session.generate(GenerationRequest::default()).await;
        assert!(session.snapshot().notice.is_some());
        session.dismiss_notice();
        assert_eq!(session.snapshot().notice, None);
    }
}
