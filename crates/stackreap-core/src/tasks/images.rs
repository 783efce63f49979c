use crate::error::Result;
use crate::task::{Completion, DeletionTask, TaskContext, Tally, pending_on_err};
use async_trait::async_trait;
use stackreap_cloud::TagQuery;
use tracing::debug;

/// Glance filters on plain tags and requires every one of them.
pub struct DeleteImages;

#[async_trait]
impl DeletionTask for DeleteImages {
    fn name(&self) -> &'static str {
        "delete-images"
    }

    async fn run(&self, ctx: &TaskContext) -> Result<Completion> {
        let task = self.name();
        let images_api = pending_on_err!(task, "image client", ctx.connector.image().await);
        let images = pending_on_err!(
            task,
            "list images",
            images_api
                .list_images(&TagQuery::Every(ctx.filter.tags_any()))
                .await
        );

        let mut tally = Tally::new(task, images.len());
        for image in images {
            debug!(task, "Deleting image {:?}", image.id);
            tally.record("image", &image.id, images_api.delete_image(&image.id).await)?;
        }
        Ok(tally.finish())
    }
}
