//! 核心宏定义

/// 为配置结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use particle_surface::impl_default;
///
/// struct SolverParams {
///     physics_iterations: u32,
///     solver_iterations: u32,
/// }
///
/// impl_default!(SolverParams {
///     physics_iterations: 3,
///     solver_iterations: 2,
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
