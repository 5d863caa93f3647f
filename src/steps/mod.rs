//! 构建节点上的各个安装步骤

pub mod archive;
pub mod buildbot;
pub mod installer;
pub mod jdk;
pub mod localsolver;
pub mod mingw;
pub mod opt_deps;
pub mod python;
pub mod pywin32;
pub mod windows_sdk;

pub use archive::{CmakeStep, MavenStep};
pub use buildbot::BuildbotStep;
pub use installer::InstallerStep;
pub use jdk::JdkStep;
pub use localsolver::{LocalSolverLicenseStep, LocalSolverStep};
pub use mingw::{MingwArch, MingwStep};
pub use opt_deps::OptDepsStep;
pub use python::PythonPathStep;
pub use pywin32::Pywin32Step;
pub use windows_sdk::WindowsSdkStep;

use crate::core::Step;

/// 标准步骤序列
///
/// 顺序有意义：7-Zip 要先于 SDK、MinGW、LocalSolver 和 pywin32 安装，
/// PATH 的修改对之后的步骤可见。
pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PythonPathStep),
        Box::new(CmakeStep),
        Box::new(MavenStep),
        Box::new(InstallerStep::dotnet()),
        Box::new(InstallerStep::sevenzip()),
        Box::new(WindowsSdkStep),
        Box::new(MingwStep::new(MingwArch::I686)),
        Box::new(MingwStep::new(MingwArch::X86_64)),
        Box::new(JdkStep::x86()),
        Box::new(JdkStep::x64()),
        Box::new(LocalSolverStep::x86()),
        Box::new(LocalSolverStep::x64()),
        Box::new(LocalSolverLicenseStep),
        Box::new(OptDepsStep),
        Box::new(Pywin32Step),
        Box::new(BuildbotStep),
    ]
}
