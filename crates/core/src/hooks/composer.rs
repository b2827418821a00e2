use super::{Fragments, Hook};
use crate::error::Result;
use crate::wrapper::Wrapper;

/// Composes the output of one hook: the wrapper's default body, then each
/// attached task's contribution in attachment order, then the optional post
/// continuation.
///
/// With a debug formatter set, the parts are interleaved with trace comments.
pub struct HookComposer<'w, H: Hook> {
    wrapper: &'w Wrapper<H>,
}

impl<'w, H: Hook> HookComposer<'w, H> {
    pub fn new(wrapper: &'w Wrapper<H>) -> Self {
        Self { wrapper }
    }

    pub fn compose<D>(&self, hook: H, out: &mut Fragments, default: D) -> Result<()>
    where
        D: FnOnce(&mut Fragments) -> Result<()>,
    {
        self.compose_with_post(hook, out, default, None::<fn(&mut Fragments) -> Result<()>>)
    }

    pub fn compose_with_post<D, P>(
        &self,
        hook: H,
        out: &mut Fragments,
        default: D,
        post: Option<P>,
    ) -> Result<()>
    where
        D: FnOnce(&mut Fragments) -> Result<()>,
        P: FnOnce(&mut Fragments) -> Result<()>,
    {
        self.debug(out, &format!("Hook '{}' enter", hook.name()));
        default(out)?;

        for task in self.wrapper.attached_tasks() {
            if task.ty.hooks().contains(&hook) {
                self.debug(out, &format!("'{}' enter hook", task.name()));
                task.ty.emit(hook, &self.wrapper.context(task), out)?;
                self.debug(out, &format!("'{}': exit hook", task.name()));
            } else {
                self.debug(out, &format!("'{}': hook not registered", task.name()));
            }
        }

        if let Some(post) = post {
            self.debug(out, &format!("Hook '{}' post", hook.name()));
            post(out)?;
        }
        self.debug(out, &format!("Hook '{}' exit", hook.name()));
        Ok(())
    }

    fn debug(&self, out: &mut Fragments, message: &str) {
        if let Some(formatter) = self.wrapper.debug_formatter() {
            out.push(formatter(message));
        }
    }
}
