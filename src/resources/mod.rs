//! Loading of models from external files.
//!
//! Native builds read from `./assets/`, WASM builds fetch relative to the
//! page origin. Loading is asynchronous so the host loop keeps presenting
//! frames while a model is on its way; the result is the root of a scene graph.

use instant::Instant;

use crate::data_structures::scene_graph::{ContainerNode, SceneNode, SharedViews, to_scene_node};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
    let location = window.location();
    let origin = location
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not accessible"))?;
    let origin = format!("{}/assets", origin);
    let base = reqwest::Url::parse(&format!("{}/", origin,))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}

/// Resolves a buffer URI relative to the file that references it.
fn sibling_path(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

/**
 * Loads a `.gltf` or `.glb` file and converts its default scene into a scene graph.
 *
 * The returned root is always a group wrapping the scene's top level nodes. Buffers
 * referenced by URI are loaded the same way as the model itself.
 */
pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<Box<dyn SceneNode>> {
    let start = Instant::now();
    let data = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&data)?;

    let total = gltf.buffers().len();
    let mut buffer_data = Vec::with_capacity(total);
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => buffer_data.push(glb_blob(&gltf)?),
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(&sibling_path(file_name, uri)).await?);
            }
        }
        log::debug!("{}: loaded buffer {}/{}", file_name, buffer_data.len(), total);
    }

    let root = build_scene(&gltf, &buffer_data)?;
    log::info!("loaded {} in {:?}", file_name, start.elapsed());
    Ok(root)
}

/// Same as [`load_model_gltf`] for a model that is already in memory.
///
/// Only the embedded binary chunk of a `.glb` can back buffers here.
pub fn load_model_gltf_from_slice(data: &[u8]) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf = gltf::Gltf::from_slice(data)?;
    let buffer_data = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => glb_blob(&gltf),
            gltf::buffer::Source::Uri(uri) => Err(anyhow::anyhow!(
                "buffer {} references {}, which can't be resolved from memory",
                buffer.index(),
                uri
            )),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    build_scene(&gltf, &buffer_data)
}

fn glb_blob(gltf: &gltf::Gltf) -> anyhow::Result<Vec<u8>> {
    gltf.blob
        .clone()
        .ok_or_else(|| anyhow::anyhow!("model references a binary chunk but has none"))
}

fn build_scene(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> anyhow::Result<Box<dyn SceneNode>> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow::anyhow!("model contains no scene"))?;

    let mut views = SharedViews::new();
    let mut root_node = ContainerNode::new(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        let child = to_scene_node(node, buffer_data, &mut views);
        root_node.add_child(child);
    }
    let mut root_node: Box<dyn SceneNode> = Box::new(root_node);
    root_node.update_world_transform_all();
    Ok(root_node)
}
