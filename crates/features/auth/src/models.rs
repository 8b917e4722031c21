use crate::APP_LABEL;
use std::sync::Arc;
use trellis_apps::{Apps, AppsError, Model, ModelClass, ModelOptions};
use trellis_kernel::domain::constants::{AUTH_USER_MODEL, DEFAULT_AUTH_USER_MODEL};

const MODULE: &str = "trellis.contrib.auth.models";
const CONTENT_TYPE: (&str, &str) = ("contenttypes", "contenttype");

fn model(object_name: &str) -> Arc<ModelClass> {
    Arc::new(ModelClass::new(ModelOptions::new(APP_LABEL, object_name, MODULE)))
}

/// Implicit many-to-many table between `owner` and `target`.
fn through(owner: &Arc<ModelClass>, target: &Arc<ModelClass>, field: &str) -> Arc<ModelClass> {
    let owner_name = owner.opts().object_name.clone();
    let table = Arc::new(ModelClass::new(
        ModelOptions::new(APP_LABEL, format!("{owner_name}_{field}"), MODULE).auto_created(true),
    ));
    table.relate(owner_name.to_lowercase(), owner.as_ref());
    table.relate(target.opts().model_name(), target.as_ref());
    table
}

/// Registers the auth models. `auth.User` is swapped out unless `user_model`
/// is the default.
///
/// # Errors
/// Returns [`AppsError::Conflict`] if another definition already claimed one of the names.
pub fn register_models(apps: &Apps, user_model: &str) -> Result<(), AppsError> {
    let permission = model("Permission");
    permission.relate_lazily(apps, "content_type", CONTENT_TYPE);

    let group = model("Group");
    group.relate("permissions", permission.as_ref());

    let swapped = (user_model != DEFAULT_AUTH_USER_MODEL).then(|| user_model.to_owned());
    let user = Arc::new(ModelClass::new(
        ModelOptions::new(APP_LABEL, "User", MODULE)
            .swappable(AUTH_USER_MODEL)
            .swapped_by(swapped.clone()),
    ));

    apps.register_model(APP_LABEL, permission.clone())?;
    apps.register_model(APP_LABEL, group.clone())?;
    apps.register_model(APP_LABEL, through(&group, &permission, "permissions"))?;
    apps.register_model(APP_LABEL, user.clone())?;

    // A swapped model gets no tables of its own.
    if swapped.is_none() {
        user.relate("groups", group.as_ref());
        user.relate("user_permissions", permission.as_ref());
        apps.register_model(APP_LABEL, through(&user, &group, "groups"))?;
        apps.register_model(APP_LABEL, through(&user, &permission, "user_permissions"))?;
    }

    Ok(())
}
