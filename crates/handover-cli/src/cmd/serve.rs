use std::path::Path;

pub fn run(root: &Path, port: u16) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let root = root.to_path_buf();
    rt.block_on(handover_server::serve(root, port))
}
