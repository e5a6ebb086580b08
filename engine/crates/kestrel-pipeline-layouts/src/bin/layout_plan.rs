//! 打印延迟管线的布局规划

use kestrel_layout_graph::CompiledLayoutGraph;
use kestrel_pipeline_layouts::build_deferred_layout;

fn main() {
    kestrel_crate_tools::init_log::init_log();
    tracy_client::Client::start();

    let mut graph = CompiledLayoutGraph::new();
    build_deferred_layout(&mut graph);
    graph.print_layout();
}
